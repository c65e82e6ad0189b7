use axum::response::Response;
use backend::types::{ApiEvent, HandlerResponse};
use backend_storage::image_record::{ImageRecord, ImageStatus};
use http_body_util::BodyExt;
use serde_json::{json, Value};

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Parse the body of a handler response
pub fn body_of(response: &HandlerResponse) -> Value {
    response.body_json().expect("response body is not JSON")
}

/// Event with a JSON-encoded string body, as delivered by an API gateway
pub fn string_body_event(payload: Value) -> ApiEvent {
    ApiEvent::from_body(Value::String(payload.to_string()))
}

/// Record as written by the upload intent handler
pub fn pending_record(user_id: &str, image_id: &str, filename: &str) -> ImageRecord {
    ImageRecord {
        user_id: user_id.to_string(),
        image_id: image_id.to_string(),
        filename: Some(filename.to_string()),
        content_type: Some("image/png".to_string()),
        object_key: Some(format!("{user_id}/{image_id}_{filename}")),
        key: None,
        bucket: Some("image-service-root".to_string()),
        status: ImageStatus::Pending,
        created_at: Some(1_700_000_000),
    }
}

/// Record whose arrival notification has been processed
pub fn uploaded_record(user_id: &str, image_id: &str, filename: &str) -> ImageRecord {
    ImageRecord {
        status: ImageStatus::Uploaded,
        ..pending_record(user_id, image_id, filename)
    }
}

/// S3 `ObjectCreated` event for the given keys
pub fn s3_event(keys: &[&str]) -> Value {
    let records: Vec<Value> = keys
        .iter()
        .map(|key| {
            json!({
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": "image-service-root" },
                    "object": { "key": key, "size": 2048 }
                }
            })
        })
        .collect();

    json!({ "Records": records })
}

/// Queue batch with one record per event, each body JSON-encoded
pub fn queue_batch(events: &[Value]) -> Value {
    let records: Vec<Value> = events
        .iter()
        .map(|event| json!({ "messageId": "m", "body": event.to_string() }))
        .collect();

    json!({ "Records": records })
}
