//! Image metadata storage module for `DynamoDB` operations
//!
//! One row per `(user_id, image_id)` pair. The table is the single source of truth
//! for record existence and upload status.

mod error;
mod normalize;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::{Deserialize, Serialize};
use strum::Display;

pub use error::{ImageStorageError, ImageStorageResult};
pub use normalize::{normalize_numbers, record_from_item};

/// Upload status of an image record
///
/// Values written by other producers are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
    /// Record created, object not yet observed in the bucket
    #[default]
    #[serde(alias = "PENDING_UPLOAD")]
    Pending,
    /// Arrival notification received for the object key
    Uploaded,
    /// Any other stored value
    #[serde(untagged)]
    Other(String),
}

impl ImageStatus {
    /// Stored attribute value
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Uploaded => "UPLOADED",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `DynamoDB` attribute names for the images table
#[derive(Debug, Clone, Copy, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ImageAttribute {
    /// Partition key - owner of the image
    UserId,
    /// Sort key - generated image identifier
    ImageId,
    /// Original filename supplied by the client
    Filename,
    /// MIME type supplied at creation
    ContentType,
    /// Upload status
    Status,
}

/// `DynamoDB` row for a single image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Partition key - owner of the image
    pub user_id: String,

    /// Sort key - generated image identifier
    pub image_id: String,

    /// Original filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// MIME type of the uploaded object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Object key, stored as `s3_key`
    #[serde(
        rename = "s3_key",
        alias = "object_key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub object_key: Option<String>,

    /// Legacy object key attribute, never written
    #[serde(default, skip_serializing)]
    pub key: Option<String>,

    /// Bucket holding the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Upload status
    #[serde(default)]
    pub status: ImageStatus,

    /// Unix timestamp (seconds) of creation; unreadable values decode as `None`
    #[serde(
        default,
        deserialize_with = "normalize::lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
}

impl ImageRecord {
    /// Object key stored on the record, preferring `s3_key` over the legacy `key`
    #[must_use]
    pub fn stored_object_key(&self) -> Option<&str> {
        self.object_key
            .as_deref()
            .or(self.key.as_deref())
            .filter(|key| !key.is_empty())
    }

    /// Whether the arrival notification for this record has been processed
    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.status == ImageStatus::Uploaded
    }
}

/// Resume marker returned by a paginated query
///
/// Maps key attribute names to their string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationKey(BTreeMap<String, String>);

impl ContinuationKey {
    /// Creates a continuation key from attribute name/value pairs
    #[must_use]
    pub const fn new(attributes: BTreeMap<String, String>) -> Self {
        Self(attributes)
    }

    /// Builds a continuation key from a `DynamoDB` `LastEvaluatedKey`
    ///
    /// Only string attributes are kept; the table's key schema is string-only.
    #[must_use]
    pub fn from_attribute_map(map: &HashMap<String, AttributeValue>) -> Self {
        Self(
            map.iter()
                .filter_map(|(name, value)| {
                    value.as_s().ok().map(|s| (name.clone(), s.clone()))
                })
                .collect(),
        )
    }

    /// Converts into an `ExclusiveStartKey` attribute map
    #[must_use]
    pub fn to_attribute_map(&self) -> HashMap<String, AttributeValue> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), AttributeValue::S(value.clone())))
            .collect()
    }

    /// Whether no attributes are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attribute value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Parameters of a partition query over a user's images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageQuery {
    /// Partition key to query
    pub user_id: String,
    /// Substring the filename must contain
    pub filename_contains: Option<String>,
    /// Exact content type
    pub content_type: Option<String>,
    /// Maximum number of rows evaluated per page (before filtering)
    pub limit: i32,
    /// Resume point from a previous page
    pub exclusive_start_key: Option<ContinuationKey>,
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePage {
    /// Records that passed the filter
    pub records: Vec<ImageRecord>,
    /// Present when the table has more rows beyond this page
    pub last_evaluated_key: Option<ContinuationKey>,
}

/// Key-value table holding image records
#[async_trait]
pub trait ImageTable: Send + Sync {
    /// Writes a record, replacing any row with the same key
    async fn put(&self, record: &ImageRecord) -> ImageStorageResult<()>;

    /// Strongly consistent read of a single record
    async fn get(&self, user_id: &str, image_id: &str) -> ImageStorageResult<Option<ImageRecord>>;

    /// Queries one page of a user's records
    async fn query(&self, query: &ImageQuery) -> ImageStorageResult<ImagePage>;

    /// Sets `status = UPLOADED` without any existence condition
    async fn mark_uploaded(&self, user_id: &str, image_id: &str) -> ImageStorageResult<()>;

    /// Removes a record
    async fn delete(&self, user_id: &str, image_id: &str) -> ImageStorageResult<()>;
}

/// Storage client for image records backed by `DynamoDB`
pub struct DynamoImageTable {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl DynamoImageTable {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for image records
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }

    fn primary_key(user_id: &str, image_id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (
                ImageAttribute::UserId.to_string(),
                AttributeValue::S(user_id.to_string()),
            ),
            (
                ImageAttribute::ImageId.to_string(),
                AttributeValue::S(image_id.to_string()),
            ),
        ])
    }
}

#[async_trait]
impl ImageTable for DynamoImageTable {
    async fn put(&self, record: &ImageRecord) -> ImageStorageResult<()> {
        let item = serde_dynamo::to_item(record)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await?;

        Ok(())
    }

    async fn get(&self, user_id: &str, image_id: &str) -> ImageStorageResult<Option<ImageRecord>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::primary_key(user_id, image_id)))
            .consistent_read(true)
            .send()
            .await?;

        response
            .item()
            .filter(|item| !item.is_empty())
            .map(|item| record_from_item(item.clone()))
            .transpose()
    }

    async fn query(&self, query: &ImageQuery) -> ImageStorageResult<ImagePage> {
        let mut request = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#uid = :uid")
            .expression_attribute_names("#uid", ImageAttribute::UserId.to_string())
            .expression_attribute_values(":uid", AttributeValue::S(query.user_id.clone()))
            .limit(query.limit);

        let mut filters = Vec::new();
        if let Some(filename) = &query.filename_contains {
            request = request
                .expression_attribute_names("#fn", ImageAttribute::Filename.to_string())
                .expression_attribute_values(":fname", AttributeValue::S(filename.clone()));
            filters.push("contains(#fn, :fname)");
        }
        if let Some(content_type) = &query.content_type {
            request = request
                .expression_attribute_names("#ct", ImageAttribute::ContentType.to_string())
                .expression_attribute_values(":ctype", AttributeValue::S(content_type.clone()));
            filters.push("#ct = :ctype");
        }
        if !filters.is_empty() {
            request = request.filter_expression(filters.join(" AND "));
        }
        if let Some(start_key) = &query.exclusive_start_key {
            request = request.set_exclusive_start_key(Some(start_key.to_attribute_map()));
        }

        let response = request.send().await?;

        tracing::debug!(
            "Query for user_id={} returned {} items, LastEvaluatedKey present: {}",
            query.user_id,
            response.items().len(),
            response.last_evaluated_key().is_some()
        );

        let records = response
            .items()
            .iter()
            .map(|item| record_from_item(item.clone()))
            .collect::<ImageStorageResult<Vec<_>>>()?;

        let last_evaluated_key = response
            .last_evaluated_key()
            .map(ContinuationKey::from_attribute_map)
            .filter(|key| !key.is_empty());

        Ok(ImagePage {
            records,
            last_evaluated_key,
        })
    }

    async fn mark_uploaded(&self, user_id: &str, image_id: &str) -> ImageStorageResult<()> {
        self.dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::primary_key(user_id, image_id)))
            .update_expression("SET #s = :st")
            .expression_attribute_names("#s", ImageAttribute::Status.to_string())
            .expression_attribute_values(
                ":st",
                AttributeValue::S(ImageStatus::Uploaded.to_string()),
            )
            .send()
            .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str, image_id: &str) -> ImageStorageResult<()> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::primary_key(user_id, image_id)))
            .send()
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_record() -> ImageRecord {
        ImageRecord {
            user_id: "alice".to_string(),
            image_id: "img1".to_string(),
            filename: Some("a.png".to_string()),
            content_type: Some("image/png".to_string()),
            object_key: Some("alice/img1_a.png".to_string()),
            key: None,
            bucket: Some("image-service-root".to_string()),
            status: ImageStatus::Pending,
            created_at: Some(1_700_000_000),
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ImageStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&ImageStatus::Uploaded).unwrap(),
            "\"UPLOADED\""
        );
        assert_eq!(ImageStatus::Uploaded.to_string(), "UPLOADED");
    }

    #[test]
    fn test_legacy_pending_status_is_read_as_pending() {
        let status: ImageStatus = serde_json::from_str("\"PENDING_UPLOAD\"").unwrap();
        assert_eq!(status, ImageStatus::Pending);
    }

    #[test]
    fn test_unknown_status_is_kept_verbatim() {
        let status: ImageStatus = serde_json::from_str("\"ARCHIVED\"").unwrap();

        assert_eq!(status, ImageStatus::Other("ARCHIVED".to_string()));
        assert_eq!(status.to_string(), "ARCHIVED");
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"ARCHIVED\"");
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(ImageAttribute::UserId.to_string(), "user_id");
        assert_eq!(ImageAttribute::ImageId.to_string(), "image_id");
        assert_eq!(ImageAttribute::Filename.to_string(), "filename");
        assert_eq!(ImageAttribute::ContentType.to_string(), "content_type");
        assert_eq!(ImageAttribute::Status.to_string(), "status");
    }

    #[test]
    fn test_record_writes_object_key_as_s3_key() {
        let json = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(json["s3_key"], "alice/img1_a.png");
        assert_eq!(json["status"], "PENDING");
        assert!(json.get("object_key").is_none());
        assert!(json.get("key").is_none());
    }

    #[test]
    fn test_record_to_item_roundtrip() {
        let record = sample_record();
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record).unwrap();

        assert_eq!(
            item.get("created_at"),
            Some(&AttributeValue::N("1700000000".to_string()))
        );
        assert_eq!(record_from_item::<ImageRecord>(item).unwrap(), record);
    }

    #[test]
    fn test_stored_object_key_falls_back_to_legacy_key() {
        let mut record = sample_record();
        record.object_key = None;
        record.key = Some("alice/img1_legacy.png".to_string());
        assert_eq!(record.stored_object_key(), Some("alice/img1_legacy.png"));

        record.key = None;
        assert_eq!(record.stored_object_key(), None);
    }

    #[test]
    fn test_continuation_key_attribute_map_conversion() {
        let mut map = HashMap::new();
        map.insert("user_id".to_string(), AttributeValue::S("alice".to_string()));
        map.insert("image_id".to_string(), AttributeValue::S("img9".to_string()));
        map.insert("size".to_string(), AttributeValue::N("3".to_string()));

        let key = ContinuationKey::from_attribute_map(&map);
        assert_eq!(key.get("user_id"), Some("alice"));
        assert_eq!(key.get("image_id"), Some("img9"));
        assert_eq!(key.get("size"), None);

        let back = key.to_attribute_map();
        assert_eq!(back.len(), 2);
        assert_eq!(
            back.get("image_id"),
            Some(&AttributeValue::S("img9".to_string()))
        );
    }
}
