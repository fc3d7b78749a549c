use chrono::NaiveTime;
use ds_api::v1alpha1::{
    ANNO_KEY_EXPOSE_PORTS,
    ExposeLink,
    PodReference,
};
use tracing::*;

use crate::ports::parse_ports;
use crate::prelude::*;
use crate::windows::is_in_alive_windows;

const POD_PHASE_RUNNING: &str = "Running";

pub fn devspace_link(name: &str, host: &str) -> String {
    format!("{name}.{host}")
}

pub fn derive_expose_links(name: &str, host: &str, csv: &str) -> Vec<ExposeLink> {
    expose_links_under(&devspace_link(name, host), csv)
}

// Reserved ports and port 0 are dropped; every other port becomes a subdomain of `link`
pub fn expose_links_under(link: &str, csv: &str) -> Vec<ExposeLink> {
    parse_ports(csv)
        .into_iter()
        .filter(|p| !RESERVED_PORTS.contains(p))
        .filter(|p| {
            if *p == 0 {
                warn!("ignoring invalid expose port {p} under {link}");
            }
            *p > 0
        })
        .map(|port| ExposeLink { link: format!("{port}.{link}"), port })
        .collect()
}

/// Computes the observed status for a DevSpace from its spec, annotations, and the current
/// wall-clock time of day.  Pod roster fields are carried over from the existing status.
pub fn derive_status(ds: &DevSpace, now: NaiveTime) -> DevSpaceStatus {
    let name = ds.name_any();
    let mut status = ds.status.clone().unwrap_or_default();

    status.link = devspace_link(&name, &ds.spec.host);
    let csv = ds.annotations().get(ANNO_KEY_EXPOSE_PORTS).map(String::as_str).unwrap_or_default();
    status.expose_links = derive_expose_links(&name, &ds.spec.host, csv);
    status.phase = Some(DevSpacePhase::Ready);

    let check = is_in_alive_windows(now, &ds.spec.windows);
    if let Some(err) = check.error {
        warn!("could not evaluate alive windows for {}: {err:#}", ds.namespaced_name());
    }
    if check.has_windows && !check.alive {
        status.phase = Some(DevSpacePhase::Off);
    }

    status
}

// A DevSpace explicitly scaled to zero may have lost its pods without the pod watcher seeing it
pub fn needs_scaled_down_check(ds: &DevSpace, status: &DevSpaceStatus) -> bool {
    status.phase != Some(DevSpacePhase::Off) && ds.spec.replicas.is_some_and(|n| n <= 0)
}

/// Summarises the pods backing a DevSpace: `Running` if any of them runs, otherwise the phase of
/// the first pod by name.
pub fn pod_roster(pods: &[corev1::Pod]) -> (String, Vec<PodReference>) {
    let mut pods: Vec<_> = pods.iter().collect();
    pods.sort_by_key(|p| p.name_any());

    let phase_of = |p: &corev1::Pod| p.status.as_ref().and_then(|s| s.phase.clone()).unwrap_or_default();
    let deploy_status = if pods.iter().any(|p| phase_of(p) == POD_PHASE_RUNNING) {
        POD_PHASE_RUNNING.into()
    } else {
        pods.first().map(|p| phase_of(p)).unwrap_or_default()
    };

    (deploy_status, pods.iter().map(|p| PodReference { name: p.name_any() }).collect())
}
