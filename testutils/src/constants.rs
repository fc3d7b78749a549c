pub const TEST_NAMESPACE: &str = "test-namespace";
pub const TEST_CTRL_NAMESPACE: &str = "ctrl-ns";
pub const TEST_DEVSPACE_NAME: &str = "demo";
pub const TEST_DEVSPACE_UID: &str = "2f4b8a1c-9d3e-4f5a-8b6c-7d8e9f0a1b2c";
pub const TEST_HOST: &str = "example.com";
pub const TEST_RESOURCE_VERSION: &str = "42";
pub const TEST_WEBHOOK_TOKEN: &str = "s3cret";
