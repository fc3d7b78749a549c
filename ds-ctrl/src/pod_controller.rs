use std::sync::Arc;

use ds_core::prelude::*;
use ds_core::status::pod_roster;
use kube::api::{
    ListParams,
    Patch,
    PatchParams,
};
use kube::runtime::controller::Action;
use serde_json::json;
use tracing::*;

use crate::context::DevSpaceContext;
use crate::controller::REQUEUE_ERROR_DURATION;
use crate::errors::*;

// Mirrors the pods of a DevSpace into its status; the pod's `app` label names the DevSpace
async fn sync_pod_status(pod: &corev1::Pod, ctx: &DevSpaceContext) -> anyhow::Result<Action> {
    let Some(ds_name) = pod.labels().get(LABEL_APP).filter(|n| !n.is_empty()) else {
        debug!("pod has no owning devspace label");
        return Ok(Action::await_change());
    };
    let ns = pod.namespace().unwrap_or_default();

    let ds_api = kube::Api::<DevSpace>::namespaced(ctx.client.clone(), &ns);
    if ds_api.get_opt(ds_name).await?.is_none() {
        debug!("devspace {ns}/{ds_name} not found");
        return Ok(Action::await_change());
    }

    let pods_api = kube::Api::<corev1::Pod>::namespaced(ctx.client.clone(), &ns);
    let pods = pods_api
        .list(&ListParams::default().labels(&format!("{LABEL_APP}={ds_name}")))
        .await?;
    let (deploy_status, pod_refs) = pod_roster(&pods.items);

    info!("devspace {ns}/{ds_name} has {} pod(s), deploy status {deploy_status:?}", pod_refs.len());
    let patch = json!({
        "status": {
            "deployStatus": deploy_status,
            "pods": pod_refs,
        }
    });
    ds_api
        .patch_status(ds_name, &PatchParams::default(), &Patch::Merge(patch))
        .await?;

    Ok(Action::await_change())
}

#[instrument(parent=None, skip_all, fields(pod=pod.namespaced_name()))]
pub async fn reconcile(pod: Arc<corev1::Pod>, ctx: Arc<DevSpaceContext>) -> Result<Action, AnyhowError> {
    Ok(sync_pod_status(&pod, &ctx).await?)
}

pub fn error_policy(pod: Arc<corev1::Pod>, err: &AnyhowError, _ctx: Arc<DevSpaceContext>) -> Action {
    let err: &anyhow::Error = err;
    error!("status sync failed for pod {}: {err:#}", pod.namespaced_name());
    Action::requeue(REQUEUE_ERROR_DURATION)
}
