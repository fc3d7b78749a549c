pub mod auth;
pub mod config;
pub mod constants;
pub mod errors;
pub mod k8s;
pub mod logging;
pub mod ports;
pub mod status;
pub mod template;
pub mod windows;

pub mod prelude {
    pub use ds_api::v1alpha1::{
        DevSpace,
        DevSpacePhase,
        DevSpaceSpec,
        DevSpaceStatus,
    };
    pub use k8s_openapi::api::core::v1 as corev1;
    pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
    pub use kube::{
        CustomResourceExt,
        ResourceExt,
    };

    pub use crate::constants::*;
    pub use crate::errors::EmptyResult;
    pub use crate::k8s::KubeResourceExt;
}
