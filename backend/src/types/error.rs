//! Error taxonomy for request handlers

use axum::http::StatusCode;
use backend_storage::{bucket::BucketError, image_record::ImageStorageError};
use thiserror::Error;

use super::HandlerResponse;

/// Errors that end a request at the handler's top-level boundary
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required input field is missing or empty
    #[error("{0}")]
    Validation(&'static str),

    /// The referenced record does not exist
    #[error("{0}")]
    NotFound(&'static str),

    /// A request-critical table operation failed
    #[error(transparent)]
    Table(#[from] ImageStorageError),

    /// A request-critical bucket operation failed
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// Anything not anticipated, including a payload that is not a JSON object
    /// or has fields of the wrong type
    #[error("{0}")]
    Unhandled(String),
}

impl HandlerError {
    /// Status code the error maps to
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Table(_) | Self::Bucket(_) | Self::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<HandlerError> for HandlerResponse {
    fn from(err: HandlerError) -> Self {
        let status = err.status_code();
        let message = err.to_string();

        match status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", status, message),
            _ => tracing::error!("Server error: {} - {}", status, message),
        }

        Self::error(status, &message)
    }
}
