use std::ops::Deref;
use std::sync::Arc;

use ds_api::v1alpha1::*;
use ds_core::auth::encode_basic_auth;
use ds_core::config::{
    Config,
    clean_invalid_languages,
};
use ds_core::errors::*;
use ds_core::k8s::{
    ChildResource,
    create_or_update_all,
};
use ds_core::prelude::*;
use ds_core::status::{
    derive_status,
    needs_scaled_down_check,
};
use kube::api::{
    ListParams,
    Patch,
    PatchParams,
    PostParams,
};
use kube::runtime::controller::Action;
use kube::runtime::events::{
    Event,
    EventType,
};
use kube::{
    Resource,
    core::ErrorResponse,
};
use serde_json::json;
use tokio::time::Duration;
use tracing::*;

use crate::context::DevSpaceContext;
use crate::errors::*;
use crate::objects::*;

pub const REQUEUE_DURATION: Duration = Duration::from_secs(REQUEUE_DELAY_SECONDS);
pub const REQUEUE_ERROR_DURATION: Duration = Duration::from_secs(ERROR_RETRY_DELAY_SECONDS);

const RENDER_EVENT_REASON: &str = "Render";

pub(crate) async fn fetch_config(ctx: &DevSpaceContext) -> Config {
    let cm_api = kube::Api::<corev1::ConfigMap>::namespaced(ctx.client.clone(), &ctx.system_ns);
    match cm_api.get_opt(CONFIG_MAP_NAME).await {
        Ok(Some(cm)) => match Config::from_config_map(&cm) {
            Ok(cfg) => {
                let mut cfg = cfg.unwrap_or_default();
                cfg.languages = clean_invalid_languages(cfg.languages);
                cfg
            },
            Err(err) => {
                error!("could not parse global config: {err:#}");
                Config::default()
            },
        },
        Ok(None) => {
            warn!("global config {}/{CONFIG_MAP_NAME} not found", ctx.system_ns);
            Config::default()
        },
        Err(err) => {
            error!("could not fetch global config: {err}");
            Config::default()
        },
    }
}

pub(crate) fn apply_defaults(ds: &mut DevSpace, config: &Config) {
    if ds.spec.image.is_empty() {
        ds.spec.image = DEFAULT_IMAGE.into();
    }
    if ds.spec.host.is_empty() {
        ds.spec.host.clone_from(&config.host);
    }

    let annotations = ds.annotations_mut();
    if annotations.get(ANNO_KEY_IMAGE_PULL_POLICY).map(String::as_str) != Some(IMAGE_PULL_POLICY_ALWAYS) {
        annotations.insert(ANNO_KEY_IMAGE_PULL_POLICY.into(), IMAGE_PULL_POLICY_IF_NOT_PRESENT.into());
    }

    for (key, value) in [
        (ANNO_KEY_STORAGE_CLASS_NAME, &config.storage_class_name),
        (ANNO_KEY_VOLUME_MODE, &config.volume_mode),
        (ANNO_KEY_VOLUME_ACCESS_MODE, &config.volume_access_mode),
        (ANNO_KEY_INGRESS_MODE, &config.ingress_mode),
    ] {
        if !value.is_empty() {
            annotations.entry(key.into()).or_insert_with(|| value.clone());
        }
    }
}

// Derives the observed status and writes it to the status subresource.  Pod roster fields are
// owned by the pod reconciler and only touched here when every pod of a scaled-down DevSpace is gone.
pub(crate) async fn update_status(ctx: &DevSpaceContext, ds: &DevSpace, ns: &str) -> DevSpaceStatus {
    let name = ds.name_any();
    let mut status = derive_status(ds, ctx.local_time());
    let mut patch = json!({
        "link": status.link,
        "exposeLinks": status.expose_links,
        "phase": status.phase,
    });

    if needs_scaled_down_check(ds, &status) {
        let pods_api = kube::Api::<corev1::Pod>::namespaced(ctx.client.clone(), ns);
        match pods_api.list(&ListParams::default().labels(&format!("{LABEL_APP}={name}"))).await {
            Ok(pods) if pods.items.is_empty() => {
                info!("no pods left for scaled-down devspace");
                status.pods.clear();
                status.deploy_status.clear();
                patch["pods"] = json!([]);
                patch["deployStatus"] = json!("");
            },
            Ok(_) => (),
            Err(err) => error!("could not list pods for {}: {err}", ds.namespaced_name()),
        }
    }

    debug!("sending status patch: {patch}");
    let ds_api = kube::Api::<DevSpace>::namespaced(ctx.client.clone(), ns);
    if let Err(err) = ds_api
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(json!({ "status": patch })))
        .await
    {
        warn!("could not update status for {}: {err}", ds.namespaced_name());
    }

    status
}

async fn publish_render_warning(ctx: &DevSpaceContext, ds: &DevSpace, err: &anyhow::Error) {
    let event = Event {
        type_: EventType::Warning,
        reason: RENDER_EVENT_REASON.into(),
        note: Some(format!("{err:#}")),
        action: "Reconciling".into(),
        secondary: None,
    };
    if let Err(e) = ctx.recorder.publish(&event, &ds.object_ref(&())).await {
        warn!("could not publish render event: {e}");
    }
}

async fn sync_basic_auth(
    ctx: &DevSpaceContext,
    ds: &mut DevSpace,
    status: &DevSpaceStatus,
    secret: Option<corev1::Secret>,
    ns: &str,
) -> EmptyResult {
    let name = ds.name_any();
    let Some(auth) = ds.spec.auth.basic_auth.clone() else {
        if ds.annotations_mut().remove(ANNO_KEY_BASIC_AUTH).is_some() {
            info!("basic auth turned off, dropping stored credentials");
            let ds_api = kube::Api::<DevSpace>::namespaced(ctx.client.clone(), ns);
            *ds = ds_api.replace(&name, &PostParams::default(), ds).await?;
        }

        let secrets_api = kube::Api::<corev1::Secret>::namespaced(ctx.client.clone(), ns);
        return match secrets_api.delete(&name, &Default::default()).await {
            Ok(_) => {
                info!("deleted basic auth secret");
                Ok(())
            },
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(()),
            Err(err) => Err(err.into()),
        };
    };

    let mut secret = secret;
    if !auth.username.is_empty() && !auth.password.is_empty() {
        info!("storing hashed basic auth credentials");
        let encoded = encode_basic_auth(&auth.username, &auth.password)?;
        ds.annotations_mut().insert(ANNO_KEY_BASIC_AUTH.into(), encoded);
        if let Some(basic_auth) = ds.spec.auth.basic_auth.as_mut() {
            basic_auth.password.clear();
        }

        let ds_api = kube::Api::<DevSpace>::namespaced(ctx.client.clone(), ns);
        *ds = ds_api.replace(&name, &PostParams::default(), ds).await?;
        secret = render_secret(&ctx.templates, &TemplateData::new(ds, status))?;
    }

    match secret {
        Some(secret) => ChildResource::Secret(secret).apply(&ctx.client).await,
        None => Ok(()),
    }
}

async fn do_reconcile(ds: &DevSpace, ctx: &DevSpaceContext) -> anyhow::Result<Action> {
    let name = ds.name_any();
    let ns = ds.namespace().ok_or_else(|| DsControllerError::missing_namespace(&name))?;
    let ds_api = kube::Api::<DevSpace>::namespaced(ctx.client.clone(), &ns);

    let Some(mut ds) = ds_api.get_opt(&name).await? else {
        info!("devspace deleted, nothing to do");
        return Ok(Action::await_change());
    };

    let config = fetch_config(ctx).await;
    apply_defaults(&mut ds, &config);
    let status = update_status(ctx, &ds, &ns).await;

    let Some(mut ds) = ds_api.get_opt(&name).await? else {
        return Ok(Action::await_change());
    };
    apply_defaults(&mut ds, &config);
    let annotations = ds.annotations_mut();
    annotations.insert(ANNO_KEY_SERVICE_NAMESPACE.into(), ctx.system_ns.clone());
    annotations.insert(ANNO_KEY_SERVICE_NAME.into(), DEFAULT_SERVICE_NAME.into());

    let children = match render_children(&ctx.templates, &TemplateData::new(&ds, &status)) {
        Ok(children) => children,
        Err(err) => {
            publish_render_warning(ctx, &ds, &err).await;
            return Err(err.context(format!("rendering children of {}", ds.namespaced_name())));
        },
    };

    let mut errs = vec![];
    let secret = children.secret.clone();
    if let Err(err) = sync_basic_auth(ctx, &mut ds, &status, secret, &ns).await {
        errs.push(err);
    }
    if let Err(err) = create_or_update_all(&ctx.client, children.into_batch()).await {
        errs.push(err);
    }
    join_errors(errs)?;

    Ok(Action::requeue(REQUEUE_DURATION))
}

#[instrument(parent=None, skip_all, fields(devspace=ds.namespaced_name()))]
pub async fn reconcile(ds: Arc<DevSpace>, ctx: Arc<DevSpaceContext>) -> Result<Action, AnyhowError> {
    Ok(do_reconcile(ds.deref(), &ctx).await?)
}

pub fn error_policy(ds: Arc<DevSpace>, err: &AnyhowError, _ctx: Arc<DevSpaceContext>) -> Action {
    let err: &anyhow::Error = err;
    error!("reconcile failed on devspace {}: {err:#}", ds.namespaced_name());
    Action::requeue(REQUEUE_ERROR_DURATION)
}
