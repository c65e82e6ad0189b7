//! API-gateway style request event

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::HandlerError;

/// Incoming request: a body (JSON string or object) and optional query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    /// Request body, either a JSON-encoded string or an inline object
    #[serde(default)]
    pub body: Option<Value>,
    /// Query string parameters
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

impl ApiEvent {
    /// Event carrying an inline JSON body
    #[must_use]
    pub const fn from_body(body: Value) -> Self {
        Self {
            body: Some(body),
            query_string_parameters: None,
        }
    }

    /// Event carrying only query parameters
    #[must_use]
    pub const fn from_query(query: HashMap<String, String>) -> Self {
        Self {
            body: None,
            query_string_parameters: Some(query),
        }
    }

    /// Builds an event from raw HTTP parts; empty parts are left unset
    #[must_use]
    pub fn from_parts(query: HashMap<String, String>, body: &[u8]) -> Self {
        Self {
            body: (!body.is_empty())
                .then(|| Value::String(String::from_utf8_lossy(body).into_owned())),
            query_string_parameters: (!query.is_empty()).then_some(query),
        }
    }

    /// Decodes the request payload
    ///
    /// The body wins when it holds at least one field; otherwise the query
    /// parameters are used.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::Unhandled` if the body is not a JSON object or a
    /// field has the wrong type
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let mut payload = self.body_object()?;

        if payload.is_empty() {
            if let Some(query) = &self.query_string_parameters {
                payload.extend(
                    query
                        .iter()
                        .map(|(name, value)| (name.clone(), Value::String(value.clone()))),
                );
            }
        }

        serde_json::from_value(Value::Object(payload))
            .map_err(|e| HandlerError::Unhandled(format!("invalid request payload: {e}")))
    }

    fn body_object(&self) -> Result<Map<String, Value>, HandlerError> {
        let parsed = match &self.body {
            None | Some(Value::Null) => return Ok(Map::new()),
            Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(Map::new()),
            Some(Value::String(raw)) => serde_json::from_str::<Value>(raw).map_err(|e| {
                HandlerError::Unhandled(format!("request body is not valid JSON: {e}"))
            })?,
            Some(other) => other.clone(),
        };

        match parsed {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(HandlerError::Unhandled(
                "request body must be a JSON object".to_string(),
            )),
        }
    }
}
