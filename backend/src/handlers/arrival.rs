//! Arrival notifications: S3 `ObjectCreated` events delivered in SQS-shaped batches

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::ImageService;
use crate::{
    codec::item_key,
    types::{HandlerError, HandlerResponse},
};

/// Batch of queue records, each carrying an S3 event in its body
///
/// Records stay undecoded so a malformed one only fails itself.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationBatch {
    /// Queue records, `null` read as empty
    #[serde(rename = "Records", default, deserialize_with = "null_as_empty")]
    pub records: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Single queue record
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueueRecord {
    /// S3 event, either JSON-encoded or inline
    #[serde(default)]
    pub body: Value,
}

impl QueueRecord {
    /// Record carrying a raw queue message body
    #[must_use]
    pub const fn from_message_body(body: String) -> Self {
        Self {
            body: Value::String(body),
        }
    }

    /// Record in its wire shape
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut record = Map::new();
        record.insert("body".to_string(), self.body);
        Value::Object(record)
    }
}

#[derive(Debug, Default, Deserialize)]
struct S3Event {
    #[serde(rename = "Records", default)]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct S3EventRecord {
    #[serde(default)]
    s3: S3Entity,
}

#[derive(Debug, Default, Deserialize)]
struct S3Entity {
    #[serde(default)]
    bucket: S3Bucket,
    #[serde(default)]
    object: S3Object,
}

#[derive(Debug, Default, Deserialize)]
struct S3Bucket {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct S3Object {
    #[serde(default)]
    key: Option<String>,
}

/// Per-object outcome of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArrivalOutcome {
    /// Key parsed and the status update attempted
    Processed {
        /// Owner recovered from the key
        user_id: String,
        /// Image recovered from the key
        image_id: String,
        /// Key as delivered, still escaped
        s3_key: String,
        /// Whether the status update succeeded
        ddb_updated: bool,
    },
    /// Key could not be mapped to a record
    Skipped {
        /// Key as delivered
        key: Option<String>,
        /// Always `skipped`
        status: &'static str,
        /// Always `parse_failed`
        reason: &'static str,
    },
    /// Queue record or its body was not an S3 event
    Failed {
        /// Parse error
        error: String,
    },
}

impl ArrivalOutcome {
    fn skipped(key: Option<String>) -> Self {
        Self::Skipped {
            key,
            status: "skipped",
            reason: "parse_failed",
        }
    }
}

/// Arrival response body
#[derive(Debug, Serialize)]
pub struct ArrivalResponse {
    /// Outcomes in input order
    pub processed: Vec<ArrivalOutcome>,
}

/// Handles a notification batch
///
/// Always answers 200 with per-object outcomes unless the event is not a batch at all.
#[instrument(skip_all)]
pub async fn handle(service: &ImageService, event: Value) -> HandlerResponse {
    let batch = match serde_json::from_value::<NotificationBatch>(event) {
        Ok(batch) => batch,
        Err(e) => {
            return HandlerError::Unhandled(format!("malformed notification event: {e}")).into()
        }
    };

    HandlerResponse::ok(&ArrivalResponse {
        processed: process_batch(service, &batch).await,
    })
}

/// Marks every parseable object key of the batch as uploaded
pub async fn process_batch(
    service: &ImageService,
    batch: &NotificationBatch,
) -> Vec<ArrivalOutcome> {
    let mut processed = Vec::new();

    for record in &batch.records {
        let event = match QueueRecord::deserialize(record)
            .and_then(|record| parse_body(&record.body))
        {
            Ok(event) => event,
            Err(e) => {
                error!("Failed to parse notification body: {e}");
                processed.push(ArrivalOutcome::Failed {
                    error: e.to_string(),
                });
                continue;
            }
        };

        for s3_record in event.records {
            processed.push(record_arrival(service, s3_record).await);
        }
    }

    info!("Processed {} arrival notifications", processed.len());
    processed
}

fn parse_body(body: &Value) -> serde_json::Result<S3Event> {
    match body {
        Value::String(raw) => serde_json::from_str(raw),
        other => S3Event::deserialize(other),
    }
}

async fn record_arrival(service: &ImageService, s3_record: S3EventRecord) -> ArrivalOutcome {
    let S3Entity { bucket, object } = s3_record.s3;

    let Some(raw_key) = object.key else {
        warn!("Skipping notification without an object key");
        return ArrivalOutcome::skipped(None);
    };

    let parsed = match item_key::decode(&raw_key) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Skipping unparseable object key: {e}");
            return ArrivalOutcome::skipped(Some(raw_key));
        }
    };

    debug!(
        "Object {raw_key} arrived in bucket {}",
        bucket.name.as_deref().unwrap_or_default()
    );

    let ddb_updated = match service
        .table
        .mark_uploaded(&parsed.user_id, &parsed.image_id)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            error!(
                "Failed to mark image {}/{} as uploaded: {e}",
                parsed.user_id, parsed.image_id
            );
            false
        }
    };

    ArrivalOutcome::Processed {
        user_id: parsed.user_id,
        image_id: parsed.image_id,
        s3_key: raw_key,
        ddb_updated,
    }
}
