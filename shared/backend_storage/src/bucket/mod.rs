//! S3-based object storage operations
mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};

pub use error::{BucketError, BucketResult};

/// Object store holding image payloads
///
/// Objects are only ever addressed by key; the store is never scanned.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket all operations are scoped to
    fn bucket(&self) -> &str;

    /// Presigned URL allowing a single PUT of `key` with the given content type
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> BucketResult<String>;

    /// Presigned URL allowing a GET of `key`
    async fn presign_get(&self, key: &str, expires_in: Duration) -> BucketResult<String>;

    /// Deletes the object stored under `key`
    async fn delete(&self, key: &str) -> BucketResult<()>;
}

/// Object store client for S3 operations
pub struct S3ObjectStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl S3ObjectStore {
    /// Creates a new object store client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for image storage
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }

    fn presigning_config(expires_in: Duration) -> BucketResult<PresigningConfig> {
        PresigningConfig::expires_in(expires_in).map_err(|e| {
            BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> BucketResult<String> {
        let presigned_request = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(presigned_request.uri().to_string())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> BucketResult<String> {
        let presigned_request = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        Ok(presigned_request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> BucketResult<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await?;

        Ok(())
    }
}
