//! In-memory collaborators for handler tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use backend_storage::{
    bucket::{BucketError, BucketResult, ObjectStore},
    image_record::{
        ContinuationKey, ImagePage, ImageQuery, ImageRecord, ImageStatus, ImageStorageError,
        ImageStorageResult, ImageTable,
    },
};

use crate::handlers::{ImageService, ServiceSettings};

type RecordKey = (String, String);

/// Table fake keyed by `(user_id, image_id)`, ordered by `image_id` within a user
///
/// Queries evaluate `limit` rows before filtering, like `DynamoDB` does.
#[derive(Default)]
pub struct InMemoryImageTable {
    records: Mutex<BTreeMap<RecordKey, ImageRecord>>,
    query_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    last_query: Mutex<Option<ImageQuery>>,
    /// Fail every `put`
    pub fail_put: AtomicBool,
    /// Fail every `get`
    pub fail_get: AtomicBool,
    /// Fail every `query`
    pub fail_query: AtomicBool,
    /// Fail every `mark_uploaded`
    pub fail_update: AtomicBool,
    /// Fail every `delete`
    pub fail_delete: AtomicBool,
}

impl InMemoryImageTable {
    /// Creates an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record directly, bypassing call accounting
    pub fn insert(&self, record: ImageRecord) {
        self.lock_records().insert(
            (record.user_id.clone(), record.image_id.clone()),
            record,
        );
    }

    /// Current copy of a record
    #[must_use]
    pub fn record(&self, user_id: &str, image_id: &str) -> Option<ImageRecord> {
        self.lock_records()
            .get(&(user_id.to_string(), image_id.to_string()))
            .cloned()
    }

    /// All stored records in key order
    #[must_use]
    pub fn records(&self) -> Vec<ImageRecord> {
        self.lock_records().values().cloned().collect()
    }

    /// Number of `query` calls
    #[must_use]
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of `mark_uploaded` calls
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Parameters of the most recent `query` call
    #[must_use]
    pub fn last_query(&self) -> Option<ImageQuery> {
        self.last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_records(&self) -> MutexGuard<'_, BTreeMap<RecordKey, ImageRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(flag: &AtomicBool, operation: &str) -> ImageStorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(ImageStorageError::Unavailable(format!(
                "{operation} unavailable"
            )));
        }
        Ok(())
    }

    fn matches_filters(record: &ImageRecord, query: &ImageQuery) -> bool {
        let filename_matches = query.filename_contains.as_deref().is_none_or(|needle| {
            record
                .filename
                .as_deref()
                .is_some_and(|filename| filename.contains(needle))
        });
        let content_type_matches = query
            .content_type
            .as_deref()
            .is_none_or(|ct| record.content_type.as_deref() == Some(ct));

        filename_matches && content_type_matches
    }
}

#[async_trait]
impl ImageTable for InMemoryImageTable {
    async fn put(&self, record: &ImageRecord) -> ImageStorageResult<()> {
        Self::check(&self.fail_put, "put")?;
        self.insert(record.clone());
        Ok(())
    }

    async fn get(&self, user_id: &str, image_id: &str) -> ImageStorageResult<Option<ImageRecord>> {
        Self::check(&self.fail_get, "get")?;
        Ok(self.record(user_id, image_id))
    }

    async fn query(&self, query: &ImageQuery) -> ImageStorageResult<ImagePage> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(query.clone());
        Self::check(&self.fail_query, "query")?;

        let start_after = query
            .exclusive_start_key
            .as_ref()
            .and_then(|key| key.get("image_id"))
            .map(ToString::to_string);

        let partition: Vec<ImageRecord> = self
            .lock_records()
            .values()
            .filter(|r| r.user_id == query.user_id)
            .filter(|r| start_after.as_ref().is_none_or(|start| r.image_id > *start))
            .cloned()
            .collect();

        let limit = usize::try_from(query.limit.max(1)).unwrap_or(usize::MAX);
        let evaluated: Vec<ImageRecord> = partition.iter().take(limit).cloned().collect();

        let last_evaluated_key = (partition.len() > evaluated.len())
            .then(|| evaluated.last())
            .flatten()
            .map(|last| {
                ContinuationKey::new(BTreeMap::from([
                    ("user_id".to_string(), last.user_id.clone()),
                    ("image_id".to_string(), last.image_id.clone()),
                ]))
            });

        Ok(ImagePage {
            records: evaluated
                .into_iter()
                .filter(|r| Self::matches_filters(r, query))
                .collect(),
            last_evaluated_key,
        })
    }

    async fn mark_uploaded(&self, user_id: &str, image_id: &str) -> ImageStorageResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_update, "update")?;

        self.lock_records()
            .entry((user_id.to_string(), image_id.to_string()))
            .or_insert_with(|| ImageRecord {
                user_id: user_id.to_string(),
                image_id: image_id.to_string(),
                filename: None,
                content_type: None,
                object_key: None,
                key: None,
                bucket: None,
                status: ImageStatus::Pending,
                created_at: None,
            })
            .status = ImageStatus::Uploaded;
        Ok(())
    }

    async fn delete(&self, user_id: &str, image_id: &str) -> ImageStorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_delete, "delete")?;

        self.lock_records()
            .remove(&(user_id.to_string(), image_id.to_string()));
        Ok(())
    }
}

/// Object store fake producing deterministic URLs and recording deletions
pub struct FakeObjectStore {
    bucket_name: String,
    presigned_puts: Mutex<Vec<(String, String, Duration)>>,
    presigned_gets: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    /// Fail every `presign_put`
    pub fail_presign_put: AtomicBool,
    /// Fail every `presign_get`
    pub fail_presign_get: AtomicBool,
    /// Fail every `delete`
    pub fail_delete: AtomicBool,
}

impl Default for FakeObjectStore {
    fn default() -> Self {
        Self::new("image-service-root")
    }
}

impl FakeObjectStore {
    /// Creates a store scoped to `bucket_name`
    #[must_use]
    pub fn new(bucket_name: &str) -> Self {
        Self {
            bucket_name: bucket_name.to_string(),
            presigned_puts: Mutex::default(),
            presigned_gets: Mutex::default(),
            deleted: Mutex::default(),
            fail_presign_put: AtomicBool::new(false),
            fail_presign_get: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    /// `(key, content_type, expiry)` of every presigned PUT
    #[must_use]
    pub fn presigned_puts(&self) -> Vec<(String, String, Duration)> {
        self.presigned_puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Keys of every presigned GET
    #[must_use]
    pub fn presigned_gets(&self) -> Vec<String> {
        self.presigned_gets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Keys passed to `delete`, including failed attempts
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn url(&self, operation: &str, key: &str, expires_in: Duration) -> String {
        format!(
            "https://{}.s3.localhost/{key}?op={operation}&X-Amz-Expires={}",
            self.bucket_name,
            expires_in.as_secs()
        )
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> BucketResult<String> {
        if self.fail_presign_put.load(Ordering::SeqCst) {
            return Err(BucketError::S3Error("presign put unavailable".to_string()));
        }
        self.presigned_puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key.to_string(), content_type.to_string(), expires_in));
        Ok(self.url("put", key, expires_in))
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> BucketResult<String> {
        if self.fail_presign_get.load(Ordering::SeqCst) {
            return Err(BucketError::S3Error("presign get unavailable".to_string()));
        }
        self.presigned_gets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_string());
        Ok(self.url("get", key, expires_in))
    }

    async fn delete(&self, key: &str) -> BucketResult<()> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BucketError::S3Error("delete unavailable".to_string()));
        }
        Ok(())
    }
}

/// Service wired to fresh fakes, returning handles to inspect them
#[must_use]
pub fn fake_service(
    settings: ServiceSettings,
) -> (ImageService, Arc<InMemoryImageTable>, Arc<FakeObjectStore>) {
    let table = Arc::new(InMemoryImageTable::new());
    let store = Arc::new(FakeObjectStore::default());
    let service = ImageService::new(table.clone(), store.clone(), settings);
    (service, table, store)
}
