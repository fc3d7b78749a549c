use std::sync::Arc;

use ds_core::config::Config;
use ds_core::prelude::*;
use k8s_openapi::api::networking::v1 as networkingv1;
use kube::api::PostParams;
use kube::runtime::controller::Action;
use tracing::*;

use crate::context::DevSpaceContext;
use crate::controller::REQUEUE_ERROR_DURATION;
use crate::errors::*;

// Keeps the first rule of the manager Ingress pointed at the host from the operator config
async fn sync_manager_host(cm: &corev1::ConfigMap, ctx: &DevSpaceContext) -> anyhow::Result<Action> {
    let ns = cm.namespace().unwrap_or_default();
    let cm_api = kube::Api::<corev1::ConfigMap>::namespaced(ctx.client.clone(), &ns);
    let Some(cm) = cm_api.get_opt(&cm.name_any()).await? else {
        debug!("configmap deleted, nothing to do");
        return Ok(Action::await_change());
    };

    let Some(config) = Config::from_config_map(&cm)? else {
        debug!("configmap carries no {CONFIG_FILE_NAME}");
        return Ok(Action::await_change());
    };
    let host = config.host.trim();
    if host.is_empty() {
        return Ok(Action::await_change());
    }

    let ingress_api = kube::Api::<networkingv1::Ingress>::namespaced(ctx.client.clone(), &ns);
    let Some(mut ingress) = ingress_api.get_opt(MANAGER_INGRESS_NAME).await? else {
        debug!("manager ingress {ns}/{MANAGER_INGRESS_NAME} not found");
        return Ok(Action::await_change());
    };

    let Some(rule) = ingress.spec.as_mut().and_then(|s| s.rules.as_mut()).and_then(|r| r.first_mut()) else {
        return Ok(Action::await_change());
    };
    if rule.host.as_deref() != Some(host) {
        info!("pointing manager ingress {ns}/{MANAGER_INGRESS_NAME} at {host}");
        rule.host = Some(host.into());
        ingress_api.replace(MANAGER_INGRESS_NAME, &PostParams::default(), &ingress).await?;
    }

    Ok(Action::await_change())
}

#[instrument(parent=None, skip_all, fields(configmap=cm.namespaced_name()))]
pub async fn reconcile(cm: Arc<corev1::ConfigMap>, ctx: Arc<DevSpaceContext>) -> Result<Action, AnyhowError> {
    Ok(sync_manager_host(&cm, &ctx).await?)
}

pub fn error_policy(cm: Arc<corev1::ConfigMap>, err: &AnyhowError, _ctx: Arc<DevSpaceContext>) -> Action {
    let err: &anyhow::Error = err;
    error!("host sync failed for configmap {}: {err:#}", cm.namespaced_name());
    Action::requeue(REQUEUE_ERROR_DURATION)
}
