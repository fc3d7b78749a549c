mod config_controller;
mod context;
mod controller;
mod errors;
mod objects;
mod pod_controller;
mod webhook;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use ds_core::logging;
use ds_core::prelude::*;
use futures::{
    StreamExt,
    future,
};
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::networking::v1 as networkingv1;
use kube::runtime::controller::Controller;
use kube::runtime::watcher;
use tracing::*;

use crate::context::DevSpaceContext;
use crate::objects::TemplateSet;
use crate::webhook::WebhookContext;

#[derive(Clone, Debug, Default, Parser)]
struct Options {
    // Directory holding template overrides; files missing here fall back to the built-in ones
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    #[arg(long, default_value = "0.0.0.0")]
    webhook_address: String,

    #[arg(long, default_value_t = 8080)]
    webhook_port: u16,

    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

#[instrument(ret, err)]
async fn run(opts: Options) -> EmptyResult {
    let system_ns = env::var(CTRL_NS_ENV_VAR).unwrap_or_else(|_| DEFAULT_CTRL_NAMESPACE.into());
    let templates = match &opts.templates_dir {
        Some(dir) => TemplateSet::load(dir)?,
        None => TemplateSet::builtin(),
    };
    let address: IpAddr = opts.webhook_address.parse()?;

    let client = kube::Client::try_default().await?;
    let ctx = Arc::new(DevSpaceContext::new(client.clone(), &system_ns, templates));

    let ds_api = kube::Api::<DevSpace>::all(client.clone());
    let ds_ctrl = Controller::new(ds_api, Default::default())
        .owns(kube::Api::<corev1::ConfigMap>::all(client.clone()), Default::default())
        .owns(kube::Api::<corev1::Secret>::all(client.clone()), Default::default())
        .owns(kube::Api::<corev1::PersistentVolumeClaim>::all(client.clone()), Default::default())
        .owns(kube::Api::<appsv1::Deployment>::all(client.clone()), Default::default())
        .owns(kube::Api::<corev1::Service>::all(client.clone()), Default::default())
        .owns(kube::Api::<networkingv1::Ingress>::all(client.clone()), Default::default())
        .run(controller::reconcile, controller::error_policy, ctx.clone())
        .for_each(|_| future::ready(()));

    let devspace_selector = format!("{LABEL_APP_KIND}={LABEL_APP_KIND_DEVSPACE}");
    let pod_api = kube::Api::<corev1::Pod>::all(client.clone());
    let pod_ctrl = Controller::new(pod_api, watcher::Config::default().labels(&devspace_selector))
        .run(pod_controller::reconcile, pod_controller::error_policy, ctx.clone())
        .for_each(|_| future::ready(()));

    let cm_api = kube::Api::<corev1::ConfigMap>::all(client.clone());
    let config_ctrl = Controller::new(cm_api, watcher::Config::default().labels(&devspace_selector))
        .run(config_controller::reconcile, config_controller::error_policy, ctx)
        .for_each(|_| future::ready(()));

    let rkt_config = rocket::Config { address, port: opts.webhook_port, ..Default::default() };
    let webhook_server = rocket::custom(&rkt_config)
        .mount("/", rocket::routes![webhook::webhook, webhook::healthz, webhook::readyz])
        .manage(WebhookContext { client });
    let webhook_task = tokio::spawn(webhook_server.launch());

    info!("devspace controller started in {system_ns}");
    tokio::select! {
        _ = ds_ctrl => Err(anyhow!("devspace controller terminated")),
        _ = pod_ctrl => Err(anyhow!("pod controller terminated")),
        _ = config_ctrl => Err(anyhow!("config controller terminated")),
        res = webhook_task => Err(anyhow!("webhook server terminated: {res:#?}")),
    }
}

#[tokio::main]
async fn main() {
    let args = Options::parse();
    logging::setup(&format!("{},rocket=warn", args.verbosity));
    if let Err(err) = run(args).await {
        error!("controller failed: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests;
