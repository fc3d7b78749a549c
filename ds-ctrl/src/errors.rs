use std::ops::Deref;

use ds_core::errors::*;
use rocket::http::Status;

// This is sortof a stupid hack, because anyhow::Error doesn't derive from
// std::error::Error, but the reconcile functions require you to return a
// result that derives from std::error::Error.  So we just wrap the anyhow,
// and then implement deref for it so we can get back to the underlying error
// wherever we actually care.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct AnyhowError(#[from] anyhow::Error);

impl Deref for AnyhowError {
    type Target = anyhow::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

err_impl! {DsControllerError,
    #[error("devspace has no namespace: {0}")]
    MissingNamespace(String),
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("the query parameters 'namespace' and 'devspace' are required")]
    MissingTarget,

    #[error("devspace {0} not found")]
    NotFound(String),

    #[error("webhook token is incorrect")]
    Forbidden,

    #[error("could not read payload")]
    BadPayload,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebhookError {
    pub fn status(&self) -> Status {
        match self {
            WebhookError::MissingTarget | WebhookError::BadPayload => Status::BadRequest,
            WebhookError::NotFound(_) => Status::NotFound,
            WebhookError::Forbidden => Status::Forbidden,
            WebhookError::Internal(_) => Status::InternalServerError,
        }
    }
}
