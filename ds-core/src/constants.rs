// Labels stamped on every workload pod; `app` carries the owning DevSpace name
pub const LABEL_APP: &str = "app";
pub const LABEL_APP_KIND: &str = "app-kind";
pub const LABEL_APP_KIND_DEVSPACE: &str = "devspace";

// Env vars
pub const CTRL_NS_ENV_VAR: &str = "CTRL_NAMESPACE";

// Global configuration
pub const CONFIG_MAP_NAME: &str = "config";
pub const CONFIG_FILE_NAME: &str = "config.json";

// Defaults
pub const DEFAULT_CTRL_NAMESPACE: &str = "default";
pub const DEFAULT_IMAGE: &str = "ghcr.io/linuxsuren/openvscode-server-full:v0.0.8";
pub const DEFAULT_SERVICE_NAME: &str = "apiserver";
// The operator's own Ingress, living next to the config ConfigMap
pub const MANAGER_INGRESS_NAME: &str = "apiserver";
pub const IMAGE_PULL_POLICY_ALWAYS: &str = "Always";
pub const IMAGE_PULL_POLICY_IF_NOT_PRESENT: &str = "IfNotPresent";

// Ports used by the IDE container and the docker sidecar; never exposed through the annotation
pub const IDE_PORT: u16 = 3000;
pub const DOCKER_PORT: u16 = 2376;
pub const RESERVED_PORTS: [u16; 2] = [IDE_PORT, DOCKER_PORT];

// Timing
pub const REQUEUE_DELAY_SECONDS: u64 = 60;
pub const ERROR_RETRY_DELAY_SECONDS: u64 = 30;
