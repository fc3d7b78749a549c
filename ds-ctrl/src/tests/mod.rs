mod controller_test;

use std::sync::Arc;

use clockabilly::mock::MockUtcClock;
use ds_core::prelude::*;
use ds_testutils::*;
use rstest::*;
use serde_json::json;

use super::*;

// 12:30:15 UTC; far enough from midnight that no timezone pushes it onto a window boundary
const MOCK_NOW_TS: i64 = 1_735_734_615;

fn devspace_path() -> String {
    format!("/apis/linuxsuren.github.io/v1alpha1/namespaces/{TEST_NAMESPACE}/devspaces/{TEST_DEVSPACE_NAME}")
}

fn core_collection(plural: &str) -> String {
    format!("/api/v1/namespaces/{TEST_NAMESPACE}/{plural}")
}

fn build_ctx(client: kube::Client) -> DevSpaceContext {
    DevSpaceContext::new(client, TEST_CTRL_NAMESPACE, TemplateSet::builtin())
        .with_clock(Arc::new(MockUtcClock::new(MOCK_NOW_TS)))
}

// Every child object except the secret is missing and gets created
fn expect_children_created(fake_apiserver: &mut MockServerBuilder) {
    for (collection, api_version, kind) in [
        (core_collection("configmaps"), "v1", "ConfigMap"),
        (core_collection("persistentvolumeclaims"), "v1", "PersistentVolumeClaim"),
        (format!("/apis/apps/v1/namespaces/{TEST_NAMESPACE}/deployments"), "apps/v1", "Deployment"),
        (core_collection("services"), "v1", "Service"),
        (format!("/apis/networking.k8s.io/v1/namespaces/{TEST_NAMESPACE}/ingresses"), "networking.k8s.io/v1", "Ingress"),
    ] {
        let body = json!({"apiVersion": api_version, "kind": kind, "metadata": {"name": TEST_DEVSPACE_NAME}});
        fake_apiserver
            .handle_not_found(format!("{collection}/{TEST_DEVSPACE_NAME}"))
            .handle_create(collection, body);
    }
}
