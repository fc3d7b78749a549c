use std::collections::BTreeSet;

use ds_api::v1alpha1::{
    ANNO_KEY_EXPOSE_PORTS,
    ANNO_KEY_WEBHOOK_TOKEN,
    ExposeLink,
};
use ds_core::ports::format_ports;
use ds_core::prelude::*;
use ds_core::status::{
    devspace_link,
    expose_links_under,
};
use kube::api::PostParams;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::Deserialize;
use serde_json::{
    Value,
    json,
};
use tracing::*;

use crate::errors::WebhookError;

pub struct WebhookContext {
    pub client: kube::Client,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PortsRequest {
    #[serde(default)]
    pub ports: Vec<i64>,
}

fn non_empty(val: Option<&str>) -> Option<&str> {
    val.filter(|v| !v.is_empty())
}

/// Records the ports a DevSpace wants reachable from outside and answers with the links they
/// will be served on.  Out-of-range ports are dropped; an empty list leaves the DevSpace as is.
pub async fn expose_ports(
    client: &kube::Client,
    namespace: Option<&str>,
    devspace: Option<&str>,
    token: Option<&str>,
    req: Option<PortsRequest>,
) -> Result<Vec<ExposeLink>, WebhookError> {
    let (Some(ns), Some(name)) = (non_empty(namespace), non_empty(devspace)) else {
        return Err(WebhookError::MissingTarget);
    };

    let ds_api = kube::Api::<DevSpace>::namespaced(client.clone(), ns);
    let Some(mut ds) = ds_api.get_opt(name).await.map_err(anyhow::Error::from)? else {
        return Err(WebhookError::NotFound(format!("{ns}/{name}")));
    };

    match ds.annotations().get(ANNO_KEY_WEBHOOK_TOKEN) {
        Some(expected) if !expected.is_empty() && Some(expected.as_str()) == token => (),
        _ => {
            warn!("rejecting webhook call for {ns}/{name}: bad token");
            return Err(WebhookError::Forbidden);
        },
    }

    let req = req.ok_or(WebhookError::BadPayload)?;
    let ports: BTreeSet<u16> = req.ports.iter().filter_map(|p| u16::try_from(*p).ok()).filter(|p| *p > 0).collect();

    if !ports.is_empty() {
        let csv = format_ports(&ports.into_iter().collect::<Vec<_>>());
        info!("exposing ports {csv} for {ns}/{name}");
        ds.annotations_mut().insert(ANNO_KEY_EXPOSE_PORTS.into(), csv);
        ds = ds_api
            .replace(name, &PostParams::default(), &ds)
            .await
            .map_err(anyhow::Error::from)?;
    }

    let link = match ds.status.as_ref().map(|s| s.link.as_str()) {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => devspace_link(name, &ds.spec.host),
    };
    let csv = ds.annotations().get(ANNO_KEY_EXPOSE_PORTS).cloned().unwrap_or_default();
    Ok(expose_links_under(&link, &csv))
}

#[rocket::post("/api/webhook?<namespace>&<devspace>&<token>", data = "<body>")]
#[instrument(parent=None, skip_all, fields(namespace=?namespace, devspace=?devspace))]
pub async fn webhook(
    ctx: &rocket::State<WebhookContext>,
    namespace: Option<String>,
    devspace: Option<String>,
    token: Option<String>,
    body: Option<Json<PortsRequest>>,
) -> Result<Json<Vec<ExposeLink>>, status::Custom<Json<Value>>> {
    let req = body.map(Json::into_inner);
    match expose_ports(&ctx.client, namespace.as_deref(), devspace.as_deref(), token.as_deref(), req).await {
        Ok(links) => Ok(Json(links)),
        Err(err) => {
            if let WebhookError::Internal(e) = &err {
                error!("webhook call failed: {e:#}");
            }
            Err(status::Custom(err.status(), Json(json!({ "message": err.to_string() }))))
        },
    }
}

#[rocket::get("/healthz")]
pub fn healthz() -> Json<Value> {
    Json(json!({ "message": "ok" }))
}

#[rocket::get("/readyz")]
pub fn readyz() -> Json<Value> {
    Json(json!({ "message": "ok" }))
}
