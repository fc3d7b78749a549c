mod apply;

pub use apply::*;
use kube::api::Resource;

use crate::errors::*;

err_impl! {KubernetesError,
    #[error("object has no namespace: {0}")]
    MissingNamespace(String),
}

pub trait KubeResourceExt {
    fn namespaced_name(&self) -> String;
}

impl<T: Resource> KubeResourceExt for T {
    fn namespaced_name(&self) -> String {
        let name = self.meta().name.clone().or_else(|| self.meta().generate_name.clone()).unwrap_or_default();
        match &self.meta().namespace {
            Some(ns) => format!("{ns}/{name}"),
            None => name,
        }
    }
}

#[cfg(test)]
pub mod tests;
