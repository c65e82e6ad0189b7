use backend_storage::image_record::ImageRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{non_empty, ImageService};
use crate::{
    codec::item_key,
    types::{ApiEvent, HandlerError, HandlerResponse},
};

/// Deletion request
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    /// Owner of the image
    #[serde(default)]
    pub user_id: Option<String>,
    /// Image to delete
    #[serde(default)]
    pub image_id: Option<String>,
}

/// Outcome of a deletion
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Deleted image
    pub image_id: String,
    /// Owner of the deleted image
    pub user_id: String,
    /// Object key of the image, `null` when none could be determined
    pub s3_key: Option<String>,
    /// Whether the object was removed from the bucket
    pub s3_deleted: bool,
    /// Whether the record was removed from the table
    pub ddb_deleted: bool,
}

/// Deletes an image record, and its object when the upload completed
#[instrument(skip_all, fields(user_id, image_id))]
pub async fn handle(service: &ImageService, event: ApiEvent) -> HandlerResponse {
    match delete_image(service, &event).await {
        Ok(response) => HandlerResponse::ok(&response),
        Err(e) => e.into(),
    }
}

async fn delete_image(
    service: &ImageService,
    event: &ApiEvent,
) -> Result<DeleteResponse, HandlerError> {
    let request: DeleteRequest = event.payload()?;
    let (Some(user_id), Some(image_id)) =
        (non_empty(request.user_id), non_empty(request.image_id))
    else {
        return Err(HandlerError::Validation(
            "user_id and image_id are required",
        ));
    };

    let span = tracing::Span::current();
    span.record("user_id", user_id.as_str());
    span.record("image_id", image_id.as_str());

    let record = service
        .table
        .get(&user_id, &image_id)
        .await?
        .ok_or(HandlerError::NotFound("image not found"))?;

    let s3_key = object_key(&record);

    let s3_deleted = match s3_key.as_deref() {
        Some(key) if record.is_uploaded() => match service.store.delete(key).await {
            Ok(()) => {
                debug!("Deleted object {key}");
                true
            }
            Err(e) => {
                error!("Failed to delete object {key}: {e}");
                false
            }
        },
        Some(_) => {
            debug!("Skipping object deletion, status is {}", record.status);
            false
        }
        None => {
            debug!("Skipping object deletion, no object key");
            // no object left to remove
            record.is_uploaded()
        }
    };

    let ddb_deleted = match service.table.delete(&user_id, &image_id).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to delete image record: {e}");
            false
        }
    };

    info!("Deleted image {image_id} (object: {s3_deleted}, record: {ddb_deleted})");

    Ok(DeleteResponse {
        image_id,
        user_id,
        s3_key,
        s3_deleted,
        ddb_deleted,
    })
}

/// Stored key first, then the legacy attribute, then a key rebuilt from the filename
fn object_key(record: &ImageRecord) -> Option<String> {
    record
        .stored_object_key()
        .map(ToString::to_string)
        .or_else(|| {
            record
                .filename
                .as_deref()
                .map(|filename| item_key::encode(&record.user_id, &record.image_id, filename))
        })
}
