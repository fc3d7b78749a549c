use std::collections::BTreeMap;

use assertables::*;
use ds_api::v1alpha1::*;
use ds_core::config::Config;
use httpmock::prelude::*;
use kube::runtime::controller::Action;
use tracing_test::traced_test;

use super::*;
use crate::controller::*;
use crate::errors::AnyhowError;

fn with_annotations(mut ds: DevSpace, annotations: &[(&str, &str)]) -> DevSpace {
    ds.metadata.annotations = Some(annotations.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect());
    ds
}

#[rstest]
#[tokio::test]
async fn test_reconcile_devspace_gone(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle_not_found(devspace_path()).build();

    let ctx = Arc::new(build_ctx(client));
    let action = controller::reconcile(Arc::new(test_devspace), ctx).await.unwrap();
    assert_eq!(action, Action::await_change());
    fake_apiserver.assert();
}

#[rstest]
fn test_apply_defaults_from_config(test_devspace: DevSpace) {
    let mut ds = test_devspace;
    ds.spec.host = "".into();
    let config = Config {
        host: "config.example.com".into(),
        storage_class_name: "fast".into(),
        volume_mode: "".into(),
        ingress_mode: "nginx".into(),
        ..Default::default()
    };

    apply_defaults(&mut ds, &config);

    assert_eq!(ds.spec.image, DEFAULT_IMAGE);
    assert_eq!(ds.spec.host, "config.example.com");
    let annotations = ds.annotations();
    assert_eq!(annotations[ANNO_KEY_IMAGE_PULL_POLICY], IMAGE_PULL_POLICY_IF_NOT_PRESENT);
    assert_eq!(annotations[ANNO_KEY_STORAGE_CLASS_NAME], "fast");
    assert_eq!(annotations[ANNO_KEY_INGRESS_MODE], "nginx");
    assert_none!(annotations.get(ANNO_KEY_VOLUME_MODE));
}

#[rstest]
#[case::always(IMAGE_PULL_POLICY_ALWAYS, IMAGE_PULL_POLICY_ALWAYS)]
#[case::never("Never", IMAGE_PULL_POLICY_IF_NOT_PRESENT)]
#[case::garbage("sometimes", IMAGE_PULL_POLICY_IF_NOT_PRESENT)]
fn test_apply_defaults_pull_policy(test_devspace: DevSpace, #[case] requested: &str, #[case] expected: &str) {
    let mut ds = with_annotations(test_devspace, &[(ANNO_KEY_IMAGE_PULL_POLICY, requested)]);
    apply_defaults(&mut ds, &Config::default());
    assert_eq!(ds.annotations()[ANNO_KEY_IMAGE_PULL_POLICY], expected);
}

#[rstest]
fn test_apply_defaults_keeps_existing_annotations(test_devspace: DevSpace) {
    let mut ds = with_annotations(test_devspace, &[(ANNO_KEY_STORAGE_CLASS_NAME, "slow")]);
    ds.spec.image = "my/image:v1".into();
    let config = Config { storage_class_name: "fast".into(), ..Default::default() };

    apply_defaults(&mut ds, &config);

    assert_eq!(ds.spec.image, "my/image:v1");
    assert_eq!(ds.spec.host, TEST_HOST);
    assert_eq!(ds.annotations()[ANNO_KEY_STORAGE_CLASS_NAME], "slow");
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_fetch_config_missing() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle_not_found(format!("/api/v1/namespaces/{TEST_CTRL_NAMESPACE}/configmaps/{CONFIG_MAP_NAME}"))
        .build();

    let config = fetch_config(&build_ctx(client)).await;
    assert_eq!(config, Config::default());
    assert!(logs_contain("not found"));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_fetch_config(test_config_map: corev1::ConfigMap) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle_get(
            format!("/api/v1/namespaces/{TEST_CTRL_NAMESPACE}/configmaps/{CONFIG_MAP_NAME}"),
            json!(test_config_map),
        )
        .build();

    let config = fetch_config(&build_ctx(client)).await;
    assert_eq!(config.host, "config.example.com");
    assert_eq!(config.storage_class_name, "fast");
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_update_status_scaled_down_without_pods(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let mut ds = test_devspace;
    ds.spec.replicas = Some(0);
    ds.status = Some(DevSpaceStatus {
        deploy_status: "Running".into(),
        pods: vec![PodReference { name: "demo-abc".into() }],
        ..Default::default()
    });

    let ds_body = json!(ds);
    fake_apiserver
        .handle(|when, then| {
            when.method(GET).path(core_collection("pods")).query_param("labelSelector", "app=demo");
            then.json_body(pod_list(vec![]));
        })
        .handle(move |when, then| {
            when.method(PATCH)
                .path(format!("{}/status", devspace_path()))
                .body_matches(r#""pods":\[\]"#)
                .body_matches(r#""deployStatus":"""#);
            then.json_body(ds_body.clone());
        })
        .build();

    let status = update_status(&build_ctx(client), &ds, TEST_NAMESPACE).await;
    assert_is_empty!(status.pods);
    assert_eq!(status.deploy_status, "");
    assert_eq!(status.phase, Some(DevSpacePhase::Ready));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_update_status_scaled_down_with_pods(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let mut ds = test_devspace;
    ds.spec.replicas = Some(0);
    ds.status = Some(DevSpaceStatus { deploy_status: "Running".into(), ..Default::default() });

    let ds_body = json!(ds);
    fake_apiserver
        .handle(|when, then| {
            when.method(GET).path(core_collection("pods"));
            then.json_body(pod_list(vec![build_devspace_pod("demo-abc", TEST_DEVSPACE_NAME, "Running")]));
        })
        .handle(move |when, then| {
            when.method(PATCH).path(format!("{}/status", devspace_path()));
            then.json_body(ds_body.clone());
        })
        .build();

    let status = update_status(&build_ctx(client), &ds, TEST_NAMESPACE).await;
    assert_eq!(status.deploy_status, "Running");
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_update_status_window_closed(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let mut ds = with_annotations(test_devspace, &[(ANNO_KEY_EXPOSE_PORTS, "8080")]);
    ds.spec.windows = vec![Window { from: "09:00".into(), to: "09:00".into() }];

    let ds_body = json!(ds);
    fake_apiserver
        .handle(move |when, then| {
            when.method(PATCH)
                .path(format!("{}/status", devspace_path()))
                .body_matches(r#""phase":"Off""#)
                .body_matches(r#""link":"8080.demo.example.com""#);
            then.json_body(ds_body.clone());
        })
        .build();

    let status = update_status(&build_ctx(client), &ds, TEST_NAMESPACE).await;
    assert_eq!(status.phase, Some(DevSpacePhase::Off));
    assert_eq!(status.link, "demo.example.com");
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_update_status_patch_failure_is_logged(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle(|when, then| {
            when.method(PATCH).path(format!("{}/status", devspace_path()));
            then.status(403).json_body(status_forbidden());
        })
        .build();

    let status = update_status(&build_ctx(client), &test_devspace, TEST_NAMESPACE).await;
    assert_eq!(status.link, "demo.example.com");
    assert!(logs_contain("could not update status"));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_reconcile_full_pass(test_devspace: DevSpace, test_config_map: corev1::ConfigMap) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let ds_body = json!(test_devspace);

    let get_body = ds_body.clone();
    fake_apiserver
        .handle_multiple(2, move |when, then| {
            when.method(GET).path(devspace_path());
            then.json_body(get_body.clone());
        })
        .handle_get(
            format!("/api/v1/namespaces/{TEST_CTRL_NAMESPACE}/configmaps/{CONFIG_MAP_NAME}"),
            json!(test_config_map),
        )
        .handle(move |when, then| {
            when.method(PATCH)
                .path(format!("{}/status", devspace_path()))
                .body_matches(r#""link":"demo.example.com""#)
                .body_matches(r#""phase":"Ready""#);
            then.json_body(ds_body.clone());
        })
        .handle(|when, then| {
            when.method(DELETE).path(format!("{}/{TEST_DEVSPACE_NAME}", core_collection("secrets")));
            then.status(404).json_body(status_not_found());
        });
    expect_children_created(&mut fake_apiserver);
    fake_apiserver.build();

    let ctx = Arc::new(build_ctx(client));
    let action = controller::reconcile(Arc::new(test_devspace), ctx).await.unwrap();
    assert_eq!(action, Action::requeue(REQUEUE_DURATION));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_reconcile_basic_auth(test_devspace: DevSpace, test_config_map: corev1::ConfigMap) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let mut ds = test_devspace;
    ds.spec.auth.basic_auth = Some(BasicAuth { username: "u".into(), password: "secret".into() });
    let ds_body = json!(ds);

    // What the apiserver hands back after the credentials are hashed
    let mut stored = ds.clone();
    stored.spec.auth.basic_auth = Some(BasicAuth { username: "u".into(), password: "".into() });
    stored.metadata.annotations = Some(BTreeMap::from([(ANNO_KEY_BASIC_AUTH.to_string(), "dTpzZWNyZXQ=".to_string())]));
    let stored_body = json!(stored);

    let get_body = ds_body.clone();
    fake_apiserver
        .handle_multiple(2, move |when, then| {
            when.method(GET).path(devspace_path());
            then.json_body(get_body.clone());
        })
        .handle_get(
            format!("/api/v1/namespaces/{TEST_CTRL_NAMESPACE}/configmaps/{CONFIG_MAP_NAME}"),
            json!(test_config_map),
        )
        .handle(move |when, then| {
            when.method(PATCH).path(format!("{}/status", devspace_path()));
            then.json_body(ds_body.clone());
        })
        .handle(move |when, then| {
            when.method(PUT)
                .path(devspace_path())
                .body_matches(r#""basicAuth":\{"username":"u"\}"#)
                .body_matches(r#""linuxsuren.github.io/basic-auth":"[A-Za-z0-9+/=]+""#);
            then.json_body(stored_body.clone());
        })
        .handle_not_found(format!("{}/{TEST_DEVSPACE_NAME}", core_collection("secrets")))
        .handle(|when, then| {
            when.method(POST).path(core_collection("secrets")).body_matches(r#""auth":"dTpzZWNyZXQ=""#);
            then.status(201).json_body(json!({"apiVersion": "v1", "kind": "Secret", "metadata": {}}));
        });
    expect_children_created(&mut fake_apiserver);
    fake_apiserver.build();

    let ctx = Arc::new(build_ctx(client));
    let action = controller::reconcile(Arc::new(ds), ctx).await.unwrap();
    assert_eq!(action, Action::requeue(REQUEUE_DURATION));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_reconcile_basic_auth_turned_off(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let mut ds = test_devspace;
    ds.metadata.annotations = Some(BTreeMap::from([(ANNO_KEY_BASIC_AUTH.to_string(), "dTpzZWNyZXQ=".to_string())]));
    let ds_body = json!(ds);

    let get_body = ds_body.clone();
    let put_body = ds_body.clone();
    fake_apiserver
        .handle_multiple(2, move |when, then| {
            when.method(GET).path(devspace_path());
            then.json_body(get_body.clone());
        })
        .handle_not_found(format!("/api/v1/namespaces/{TEST_CTRL_NAMESPACE}/configmaps/{CONFIG_MAP_NAME}"))
        .handle(move |when, then| {
            when.method(PATCH).path(format!("{}/status", devspace_path()));
            then.json_body(ds_body.clone());
        })
        .handle(move |when, then| {
            // Only the service annotations survive; the stored hash is gone
            when.method(PUT)
                .path(devspace_path())
                .body_matches(
                    r#""annotations":\{"linuxsuren.github.io/service-name":"apiserver","linuxsuren.github.io/service-namespace":"ctrl-ns"\}"#,
                );
            then.json_body(put_body.clone());
        })
        .handle(|when, then| {
            when.method(DELETE).path(format!("{}/{TEST_DEVSPACE_NAME}", core_collection("secrets")));
            then.status(404).json_body(status_not_found());
        });
    expect_children_created(&mut fake_apiserver);
    fake_apiserver.build();

    let ctx = Arc::new(build_ctx(client));
    let action = controller::reconcile(Arc::new(ds), ctx).await.unwrap();
    assert_eq!(action, Action::requeue(REQUEUE_DURATION));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_reconcile_child_failure_still_applies_the_rest(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let ds_body = json!(test_devspace);

    let get_body = ds_body.clone();
    fake_apiserver
        .handle_multiple(2, move |when, then| {
            when.method(GET).path(devspace_path());
            then.json_body(get_body.clone());
        })
        .handle_not_found(format!("/api/v1/namespaces/{TEST_CTRL_NAMESPACE}/configmaps/{CONFIG_MAP_NAME}"))
        .handle(move |when, then| {
            when.method(PATCH).path(format!("{}/status", devspace_path()));
            then.json_body(ds_body.clone());
        })
        .handle(|when, then| {
            when.method(DELETE).path(format!("{}/{TEST_DEVSPACE_NAME}", core_collection("secrets")));
            then.status(403).json_body(status_forbidden());
        });
    expect_children_created(&mut fake_apiserver);
    fake_apiserver.build();

    let ctx = Arc::new(build_ctx(client));
    let res = controller::reconcile(Arc::new(test_devspace), ctx).await;
    assert_err!(res);
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_reconcile_render_failure(test_devspace: DevSpace) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let ds_body = json!(test_devspace);

    let get_body = ds_body.clone();
    fake_apiserver
        .handle_multiple(2, move |when, then| {
            when.method(GET).path(devspace_path());
            then.json_body(get_body.clone());
        })
        .handle_not_found(format!("/api/v1/namespaces/{TEST_CTRL_NAMESPACE}/configmaps/{CONFIG_MAP_NAME}"))
        .handle(move |when, then| {
            when.method(PATCH).path(format!("{}/status", devspace_path()));
            then.json_body(ds_body.clone());
        })
        .build();

    let mut templates = TemplateSet::builtin();
    templates.service = "{% if %}".into();
    let mut ctx = build_ctx(client);
    ctx.templates = Arc::new(templates);

    let err = controller::reconcile(Arc::new(test_devspace), Arc::new(ctx)).await.unwrap_err();
    assert_contains!(format!("{:#}", *err), "service.yaml");
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_error_policy(test_devspace: DevSpace) {
    let (_, client) = make_fake_apiserver();
    let err = AnyhowError::from(anyhow::anyhow!("boom"));
    let action = controller::error_policy(Arc::new(test_devspace), &err, Arc::new(build_ctx(client)));
    assert_eq!(action, Action::requeue(REQUEUE_ERROR_DURATION));
    assert!(logs_contain("boom"));
}
