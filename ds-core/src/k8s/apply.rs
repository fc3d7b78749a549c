use std::fmt::Debug;

use anyhow::Context;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::networking::v1 as networkingv1;
use kube::api::{
    Api,
    PostParams,
    Resource,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::*;

use super::*;
use crate::errors::*;
use crate::prelude::*;

/// Makes the cluster copy of `obj` match the desired object.  Objects without a name (only a
/// `generateName`) are always created; otherwise a missing object is created and an existing
/// one is fully replaced, carrying over its live `resourceVersion`.
pub async fn create_or_update<K>(client: &kube::Client, obj: &K) -> EmptyResult
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + Debug + DeserializeOwned + Serialize,
{
    create_or_update_with(client, obj, |_, _| ()).await
}

// `keep` copies server-populated fields from the live object onto the desired one before a replace
pub async fn create_or_update_with<K, F>(client: &kube::Client, obj: &K, keep: F) -> EmptyResult
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + Debug + DeserializeOwned + Serialize,
    F: Fn(&mut K, &K),
{
    let id = format!("{} {}", K::kind(&()), obj.namespaced_name());
    let ns = obj.meta().namespace.as_deref().ok_or_else(|| KubernetesError::missing_namespace(&id))?;
    let api: Api<K> = Api::namespaced(client.clone(), ns);
    let pp = PostParams::default();

    let name = obj.meta().name.clone().unwrap_or_default();
    if name.is_empty() {
        info!("creating {id}");
        api.create(&pp, obj).await.with_context(|| format!("creating {id}"))?;
        return Ok(());
    }

    match api.get_opt(&name).await.with_context(|| format!("fetching {id}"))? {
        None => {
            info!("creating {id}");
            api.create(&pp, obj).await.with_context(|| format!("creating {id}"))?;
        },
        Some(live) => {
            debug!("updating {id}");
            let mut desired = obj.clone();
            keep(&mut desired, &live);
            desired.meta_mut().resource_version = live.meta().resource_version.clone();
            api.replace(&name, &pp, &desired)
                .await
                .with_context(|| format!("updating {id}"))?;
        },
    }
    Ok(())
}

// A claim's spec is immutable once bound, so anything the cluster filled in has to survive the replace
fn keep_claim_binding(desired: &mut corev1::PersistentVolumeClaim, live: &corev1::PersistentVolumeClaim) {
    if let (Some(spec), Some(live_spec)) = (desired.spec.as_mut(), live.spec.as_ref()) {
        if spec.volume_name.is_none() {
            spec.volume_name.clone_from(&live_spec.volume_name);
        }
        if spec.storage_class_name.is_none() {
            spec.storage_class_name.clone_from(&live_spec.storage_class_name);
        }
        if spec.volume_mode.is_none() {
            spec.volume_mode.clone_from(&live_spec.volume_mode);
        }
    }
}

/// One rendered child object of a DevSpace.
#[derive(Clone, Debug)]
pub enum ChildResource {
    ConfigMap(corev1::ConfigMap),
    Secret(corev1::Secret),
    PersistentVolumeClaim(corev1::PersistentVolumeClaim),
    Deployment(appsv1::Deployment),
    Service(corev1::Service),
    Ingress(networkingv1::Ingress),
}

impl ChildResource {
    pub async fn apply(&self, client: &kube::Client) -> EmptyResult {
        match self {
            ChildResource::ConfigMap(obj) => create_or_update(client, obj).await,
            ChildResource::Secret(obj) => create_or_update(client, obj).await,
            ChildResource::PersistentVolumeClaim(obj) => create_or_update_with(client, obj, keep_claim_binding).await,
            ChildResource::Deployment(obj) => create_or_update(client, obj).await,
            ChildResource::Service(obj) => create_or_update(client, obj).await,
            ChildResource::Ingress(obj) => create_or_update(client, obj).await,
        }
    }
}

// Every resource is attempted even if an earlier one fails
pub async fn create_or_update_all(client: &kube::Client, objs: Vec<Option<ChildResource>>) -> EmptyResult {
    let mut errs = vec![];
    for obj in objs.into_iter().flatten() {
        if let Err(err) = obj.apply(client).await {
            warn!("{err:#}");
            errs.push(err);
        }
    }
    join_errors(errs)
}
