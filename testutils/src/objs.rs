use std::collections::BTreeMap;

use ds_api::v1alpha1::*;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use rstest::fixture;
use serde_json::json;

use crate::constants::*;

#[fixture]
pub fn test_devspace(#[default(TEST_DEVSPACE_NAME)] name: &str) -> DevSpace {
    let mut ds = DevSpace::new(name, DevSpaceSpec { host: TEST_HOST.into(), ..Default::default() });
    ds.metadata.namespace = Some(TEST_NAMESPACE.into());
    ds.metadata.uid = Some(TEST_DEVSPACE_UID.into());
    ds.metadata.resource_version = Some(TEST_RESOURCE_VERSION.into());
    ds
}

#[fixture]
pub fn test_config_map() -> corev1::ConfigMap {
    corev1::ConfigMap {
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_CTRL_NAMESPACE.into()),
            name: Some("config".into()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "config.json".to_string(),
            json!({
                "host": "config.example.com",
                "storageClassName": "fast",
                "ingressMode": "path",
            })
            .to_string(),
        )])),
        ..Default::default()
    }
}

pub fn build_devspace_pod(name: &str, devspace: &str, phase: &str) -> corev1::Pod {
    corev1::Pod {
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some(name.into()),
            labels: Some(BTreeMap::from([
                ("app".to_string(), devspace.to_string()),
                ("app-kind".to_string(), "devspace".to_string()),
            ])),
            ..Default::default()
        },
        status: Some(corev1::PodStatus { phase: Some(phase.into()), ..Default::default() }),
        ..Default::default()
    }
}

pub fn pod_list(pods: Vec<corev1::Pod>) -> serde_json::Value {
    json!({
        "kind": "PodList",
        "apiVersion": "v1",
        "metadata": {"resourceVersion": "1"},
        "items": pods,
    })
}
