use minijinja::Environment;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::*;

err_impl! {TemplateError,
    #[error("could not render template: {0}")]
    RenderFailed(String),

    #[error("could not decode rendered template: {0}")]
    DecodeFailed(String),
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}

/// Renders a resource template against `data` and decodes the result into `T`.  A template
/// that renders to nothing but whitespace means "do not create" and yields `Ok(None)`.
pub fn render<T, D>(text: &str, data: &D) -> anyhow::Result<Option<T>>
where
    T: DeserializeOwned,
    D: Serialize,
{
    let rendered = environment()
        .render_str(text, data)
        .map_err(|e| TemplateError::render_failed(&format!("{e:#}")))?;

    if rendered.trim().is_empty() {
        return Ok(None);
    }

    let obj = serde_yaml::from_str(&rendered).map_err(|e| TemplateError::decode_failed(&e.to_string()))?;
    Ok(Some(obj))
}
