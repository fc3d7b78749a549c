use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{
    Deserialize,
    Serialize,
};

use crate::prelude::*;

/// Operator-wide settings, stored as JSON under `config.json` in the `config` ConfigMap of the
/// controller namespace.  Every field is optional on the wire.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub storage_class_name: String,
    pub volume_mode: String,
    pub volume_access_mode: String,
    pub ingress_mode: String,
    pub image_pull_policy: String,
    pub host: String,
    pub languages: Vec<Language>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Language {
    pub name: String,
    pub image: String,
}

impl Config {
    pub fn parse_json(data: &[u8]) -> anyhow::Result<Config> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn to_json(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading config file {}", path.display()))?;
        Config::parse_json(&data)
    }

    // Returns None when the config key is absent or empty
    pub fn from_config_map(cm: &corev1::ConfigMap) -> anyhow::Result<Option<Config>> {
        match cm.data.as_ref().and_then(|d| d.get(CONFIG_FILE_NAME)) {
            Some(data) if !data.is_empty() => Ok(Some(Config::parse_json(data.as_bytes())?)),
            _ => Ok(None),
        }
    }
}

pub fn clean_invalid_languages(languages: Vec<Language>) -> Vec<Language> {
    languages
        .into_iter()
        .map(|l| Language { name: l.name.trim().into(), image: l.image.trim().into() })
        .filter(|l| !l.name.is_empty() && !l.image.is_empty())
        .collect()
}
