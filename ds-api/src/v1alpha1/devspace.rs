use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

pub const ANNO_KEY_EXPOSE_PORTS: &str = "linuxsuren.github.io/expose-ports";
pub const ANNO_KEY_WEBHOOK_TOKEN: &str = "linuxsuren.github.io/webhook-token";
pub const ANNO_KEY_IMAGE_PULL_POLICY: &str = "linuxsuren.github.io/image-pull-policy";
pub const ANNO_KEY_STORAGE_CLASS_NAME: &str = "linuxsuren.github.io/storage-class-name";
pub const ANNO_KEY_VOLUME_ACCESS_MODE: &str = "linuxsuren.github.io/volume-access-mode";
pub const ANNO_KEY_VOLUME_MODE: &str = "linuxsuren.github.io/volume-mode";
pub const ANNO_KEY_INGRESS_MODE: &str = "linuxsuren.github.io/ingress-mode";
pub const ANNO_KEY_BASIC_AUTH: &str = "linuxsuren.github.io/basic-auth";
pub const ANNO_KEY_MAINTAIN_MODE: &str = "linuxsuren.github.io/maintain-mode";
pub const ANNO_KEY_SERVICE_NAMESPACE: &str = "linuxsuren.github.io/service-namespace";
pub const ANNO_KEY_SERVICE_NAME: &str = "linuxsuren.github.io/service-name";

fn default_cpu() -> String {
    "2".into()
}

fn default_memory() -> String {
    "4Gi".into()
}

fn default_storage() -> String {
    "50Gi".into()
}

fn default_replicas() -> Option<i32> {
    Some(1)
}

fn default_branch() -> String {
    "master".into()
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum DevSpacePhase {
    Ready,
    Off,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct Window {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct BasicAuth {
    pub username: String,

    // Cleared by the controller as soon as the hash has been stored in an annotation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevSpaceAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct GitRepository {
    pub url: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct HostAlias {
    pub ip: String,

    #[serde(default)]
    pub hostnames: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct Docker {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct MySql {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct Redis {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

// Add-on services that run as sidecars next to the IDE container
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct Services {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker: Option<Docker>,

    #[serde(rename = "mysql", skip_serializing_if = "Option::is_none")]
    pub mysql: Option<MySql>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<Redis>,
}

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(group = "linuxsuren.github.io", version = "v1alpha1", kind = "DevSpace", namespaced)]
#[kube(shortname = "ds")]
#[kube(status = "DevSpaceStatus")]
#[kube(
    printcolumn = r#"{"name":"Link", "type":"string", "jsonPath":".status.link"}"#,
    printcolumn = r#"{"name":"DeployStatus", "type":"string", "jsonPath":".status.deployStatus"}"#,
    printcolumn = r#"{"name":"Replicas", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DevSpaceSpec {
    #[serde(default = "default_cpu")]
    pub cpu: String,

    #[serde(default = "default_memory")]
    pub memory: String,

    #[serde(default = "default_storage")]
    pub storage: String,

    #[serde(default)]
    pub image: String,

    #[serde(default = "default_replicas")]
    pub replicas: Option<i32>,

    #[serde(default)]
    pub host: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<GitRepository>,

    #[serde(default)]
    pub auth: DevSpaceAuth,

    #[serde(rename = "env", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_aliases: Vec<HostAlias>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub windows: Vec<Window>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub init_script: String,

    #[serde(default)]
    pub services: Services,
}

impl Default for DevSpaceSpec {
    fn default() -> Self {
        DevSpaceSpec {
            cpu: default_cpu(),
            memory: default_memory(),
            storage: default_storage(),
            image: String::new(),
            replicas: default_replicas(),
            host: String::new(),
            repository: None,
            auth: Default::default(),
            environment: BTreeMap::new(),
            host_aliases: vec![],
            windows: vec![],
            init_script: String::new(),
            services: Default::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct ExposeLink {
    pub link: String,
    pub port: u16,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct PodReference {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevSpaceStatus {
    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub expose_links: Vec<ExposeLink>,

    #[serde(default)]
    pub deploy_status: String,

    #[serde(default)]
    pub pods: Vec<PodReference>,

    pub phase: Option<DevSpacePhase>,
}
