use backend_storage::image_record::{ImageRecord, ImageStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{non_empty, ImageService};
use crate::{
    codec::item_key,
    types::{ApiEvent, HandlerError, HandlerResponse},
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upload intent request
#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    /// Owner of the new image
    #[serde(default)]
    pub user_id: Option<String>,
    /// Original filename, part of the object key
    #[serde(default)]
    pub filename: Option<String>,
    /// MIME type the upload must be sent with
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Upload intent response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Presigned PUT URL
    pub upload_url: String,
    /// Bucket the object will land in
    pub bucket: String,
    /// Object key
    pub key: String,
    /// URL lifetime in seconds
    pub expires_in: u64,
    /// Generated image identifier
    pub image_id: String,
}

/// Creates a pending image record and returns a presigned upload URL
#[instrument(skip_all, fields(user_id, image_id))]
pub async fn handle(service: &ImageService, event: ApiEvent) -> HandlerResponse {
    match create_upload(service, &event).await {
        Ok(response) => HandlerResponse::ok(&response),
        Err(e) => e.into(),
    }
}

async fn create_upload(
    service: &ImageService,
    event: &ApiEvent,
) -> Result<UploadResponse, HandlerError> {
    let request: UploadRequest = event.payload()?;

    let (Some(user_id), Some(filename)) =
        (non_empty(request.user_id), non_empty(request.filename))
    else {
        return Err(HandlerError::Validation(
            "user_id and filename are required",
        ));
    };
    let content_type =
        non_empty(request.content_type).unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let image_id = Uuid::new_v4().to_string();
    let key = item_key::encode(&user_id, &image_id, &filename);

    let span = tracing::Span::current();
    span.record("user_id", user_id.as_str());
    span.record("image_id", image_id.as_str());

    debug!("Generating presigned upload URL for {key}");
    let expires_in = service.settings.presign_expiry_secs;
    let upload_url = service
        .store
        .presign_put(&key, &content_type, service.settings.presign_expiry())
        .await?;

    let bucket = service.store.bucket().to_string();
    let record = ImageRecord {
        user_id,
        image_id: image_id.clone(),
        filename: Some(filename),
        content_type: Some(content_type),
        object_key: Some(key.clone()),
        key: None,
        bucket: Some(bucket.clone()),
        status: ImageStatus::Pending,
        created_at: Some(chrono::Utc::now().timestamp()),
    };

    debug!("Persisting pending image record");
    service.table.put(&record).await?;

    info!("Issued upload URL for image {image_id}");

    Ok(UploadResponse {
        upload_url,
        bucket,
        key,
        expires_in,
        image_id,
    })
}
