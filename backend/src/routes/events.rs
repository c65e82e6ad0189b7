use axum::{body::Bytes, Extension};
use serde_json::Value;

use crate::{
    handlers::{arrival, ImageService},
    types::{HandlerError, HandlerResponse},
};

/// Receives an S3 notification batch pushed directly over HTTP
pub async fn object_created(
    Extension(service): Extension<ImageService>,
    body: Bytes,
) -> HandlerResponse {
    match serde_json::from_slice::<Value>(&body) {
        Ok(event) => arrival::handle(&service, event).await,
        Err(e) => HandlerError::Unhandled(format!("malformed notification event: {e}")).into(),
    }
}
