use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use ds_api::v1alpha1::*;
use ds_core::errors::*;
use ds_core::k8s::ChildResource;
use ds_core::prelude::*;
use ds_core::template::render;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::networking::v1 as networkingv1;
use kube::Resource;
use serde::Serialize;
use tracing::*;

const CONFIGMAP_TEMPLATE: &str = "configmap.yaml";
const SECRET_TEMPLATE: &str = "secret.yaml";
const PVC_TEMPLATE: &str = "pvc.yaml";
const DEPLOYMENT_TEMPLATE: &str = "deployment.yaml";
const SERVICE_TEMPLATE: &str = "service.yaml";
const INGRESS_TEMPLATE: &str = "ingress.yaml";
const EXPOSE_INGRESS_TEMPLATE: &str = "ingress-expose.yaml";

/// Everything the child resource templates can see.  Built from a defaulted DevSpace and the
/// status derived for it on the same pass.
#[derive(Clone, Debug, Serialize)]
pub struct TemplateData {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub api_version: String,
    pub kind: String,

    pub image: String,
    pub cpu: String,
    pub memory: String,
    pub storage: String,
    pub replicas: i32,

    pub host: String,
    pub link: String,
    pub expose_ports: Vec<u16>,

    pub env: BTreeMap<String, String>,
    pub host_aliases: Vec<HostAlias>,
    pub init_script: String,
    pub repository: Option<GitRepository>,
    pub services: Services,

    pub image_pull_policy: String,
    pub storage_class_name: String,
    pub volume_access_mode: String,
    pub volume_mode: String,
    pub ingress_mode: String,
    pub basic_auth: String,
    pub maintain_mode: String,
    pub webhook_token: String,
    pub service_namespace: String,
    pub service_name: String,
}

impl TemplateData {
    pub fn new(ds: &DevSpace, status: &DevSpaceStatus) -> TemplateData {
        let annotation = |key: &str| ds.annotations().get(key).cloned().unwrap_or_default();

        // An Off DevSpace keeps its storage and networking but runs no pods
        let replicas = match status.phase {
            Some(DevSpacePhase::Off) => 0,
            _ => ds.spec.replicas.unwrap_or(1),
        };

        TemplateData {
            name: ds.name_any(),
            namespace: ds.namespace().unwrap_or_default(),
            uid: ds.uid().unwrap_or_default(),
            api_version: DevSpace::api_version(&()).into(),
            kind: DevSpace::kind(&()).into(),

            image: ds.spec.image.clone(),
            cpu: ds.spec.cpu.clone(),
            memory: ds.spec.memory.clone(),
            storage: ds.spec.storage.clone(),
            replicas,

            host: ds.spec.host.clone(),
            link: status.link.clone(),
            expose_ports: status.expose_links.iter().map(|l| l.port).collect(),

            env: ds.spec.environment.clone(),
            host_aliases: ds.spec.host_aliases.clone(),
            init_script: ds.spec.init_script.clone(),
            repository: ds.spec.repository.clone(),
            services: ds.spec.services.clone(),

            image_pull_policy: annotation(ANNO_KEY_IMAGE_PULL_POLICY),
            storage_class_name: annotation(ANNO_KEY_STORAGE_CLASS_NAME),
            volume_access_mode: annotation(ANNO_KEY_VOLUME_ACCESS_MODE),
            volume_mode: annotation(ANNO_KEY_VOLUME_MODE),
            ingress_mode: annotation(ANNO_KEY_INGRESS_MODE),
            // A leftover hash must not keep the ingress locked once basic auth is turned off
            basic_auth: match ds.spec.auth.basic_auth {
                Some(_) => annotation(ANNO_KEY_BASIC_AUTH),
                None => String::new(),
            },
            maintain_mode: annotation(ANNO_KEY_MAINTAIN_MODE),
            webhook_token: annotation(ANNO_KEY_WEBHOOK_TOKEN),
            service_namespace: annotation(ANNO_KEY_SERVICE_NAMESPACE),
            service_name: annotation(ANNO_KEY_SERVICE_NAME),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TemplateSet {
    pub configmap: String,
    pub secret: String,
    pub pvc: String,
    pub deployment: String,
    pub service: String,
    pub ingress: String,
    pub expose_ingress: String,
}

impl TemplateSet {
    pub fn builtin() -> TemplateSet {
        TemplateSet {
            configmap: include_str!("../templates/configmap.yaml").into(),
            secret: include_str!("../templates/secret.yaml").into(),
            pvc: include_str!("../templates/pvc.yaml").into(),
            deployment: include_str!("../templates/deployment.yaml").into(),
            service: include_str!("../templates/service.yaml").into(),
            ingress: include_str!("../templates/ingress.yaml").into(),
            expose_ingress: include_str!("../templates/ingress-expose.yaml").into(),
        }
    }

    // Any template file present in `dir` replaces the built-in one of the same name
    pub fn load(dir: &Path) -> anyhow::Result<TemplateSet> {
        let mut set = TemplateSet::builtin();
        for (file, text) in [
            (CONFIGMAP_TEMPLATE, &mut set.configmap),
            (SECRET_TEMPLATE, &mut set.secret),
            (PVC_TEMPLATE, &mut set.pvc),
            (DEPLOYMENT_TEMPLATE, &mut set.deployment),
            (SERVICE_TEMPLATE, &mut set.service),
            (INGRESS_TEMPLATE, &mut set.ingress),
            (EXPOSE_INGRESS_TEMPLATE, &mut set.expose_ingress),
        ] {
            let path = dir.join(file);
            if path.exists() {
                info!("loading template override {}", path.display());
                *text = fs::read_to_string(&path).with_context(|| format!("reading template {}", path.display()))?;
            }
        }
        Ok(set)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RenderedChildren {
    pub configmap: Option<corev1::ConfigMap>,
    pub secret: Option<corev1::Secret>,
    pub pvc: Option<corev1::PersistentVolumeClaim>,
    pub deployment: Option<appsv1::Deployment>,
    pub service: Option<corev1::Service>,
    pub ingress: Option<networkingv1::Ingress>,
    pub expose_ingress: Option<networkingv1::Ingress>,
}

impl RenderedChildren {
    // Everything except the secret, whose lifecycle follows the basic-auth settings
    pub fn into_batch(self) -> Vec<Option<ChildResource>> {
        vec![
            self.configmap.map(ChildResource::ConfigMap),
            self.pvc.map(ChildResource::PersistentVolumeClaim),
            self.deployment.map(ChildResource::Deployment),
            self.service.map(ChildResource::Service),
            self.ingress.map(ChildResource::Ingress),
            self.expose_ingress.map(ChildResource::Ingress),
        ]
    }
}

fn render_one<T: serde::de::DeserializeOwned>(
    file: &str,
    text: &str,
    data: &TemplateData,
    errs: &mut Vec<anyhow::Error>,
) -> Option<T> {
    match render(text, data) {
        Ok(obj) => obj,
        Err(err) => {
            errs.push(err.context(format!("template {file}")));
            None
        },
    }
}

/// Renders every child template.  A failing template does not stop the others from being
/// rendered; all failures are reported together.
pub fn render_children(templates: &TemplateSet, data: &TemplateData) -> anyhow::Result<RenderedChildren> {
    let mut errs = vec![];
    let children = RenderedChildren {
        configmap: render_one(CONFIGMAP_TEMPLATE, &templates.configmap, data, &mut errs),
        secret: render_one(SECRET_TEMPLATE, &templates.secret, data, &mut errs),
        pvc: render_one(PVC_TEMPLATE, &templates.pvc, data, &mut errs),
        deployment: render_one(DEPLOYMENT_TEMPLATE, &templates.deployment, data, &mut errs),
        service: render_one(SERVICE_TEMPLATE, &templates.service, data, &mut errs),
        ingress: render_one(INGRESS_TEMPLATE, &templates.ingress, data, &mut errs),
        expose_ingress: render_one(EXPOSE_INGRESS_TEMPLATE, &templates.expose_ingress, data, &mut errs),
    };
    join_errors(errs)?;
    Ok(children)
}

pub fn render_secret(templates: &TemplateSet, data: &TemplateData) -> anyhow::Result<Option<corev1::Secret>> {
    render(&templates.secret, data).with_context(|| format!("template {SECRET_TEMPLATE}"))
}
