//! `{statusCode, body}` response envelope shared by every handler

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Handler response: a status code and a JSON-encoded body string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    /// HTTP-equivalent status code
    pub status_code: u16,
    /// JSON document serialized to a string
    pub body: String,
}

impl HandlerResponse {
    /// Serializes `body` into a response with the given status
    ///
    /// Falls back to a 500 response if the body cannot be serialized.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self {
                status_code: status.as_u16(),
                body,
            },
            Err(e) => {
                tracing::error!("Failed to serialize response body: {e}");
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }

    /// 200 response
    pub fn ok<T: Serialize>(body: &T) -> Self {
        Self::json(StatusCode::OK, body)
    }

    /// Error response with body `{"error": message}`
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status_code: status.as_u16(),
            body: json!({ "error": message }).to_string(),
        }
    }

    /// Parses the body back into a JSON value
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}
