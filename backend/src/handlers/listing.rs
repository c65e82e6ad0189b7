use backend_storage::image_record::{ImageQuery, ImageRecord, ImageStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{non_empty, ImageService};
use crate::{
    codec::page_token,
    types::{ApiEvent, HandlerError, HandlerResponse},
};

/// Listing request
#[derive(Debug, Default, Deserialize)]
pub struct ListRequest {
    /// Owner whose images are listed
    #[serde(default)]
    pub user_id: Option<String>,
    /// Substring the filename must contain
    #[serde(default)]
    pub filename: Option<String>,
    /// Exact content type
    #[serde(default)]
    pub content_type: Option<String>,
    /// Token returned by a previous page
    #[serde(default)]
    pub page_token: Option<String>,
}

/// Download details, only present for uploaded images
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadInfo {
    /// Bucket holding the object
    pub bucket: String,
    /// Object key
    pub s3_key: String,
    /// Presigned GET URL, `null` when signing failed
    pub signed_url: Option<String>,
}

/// One entry of a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedImage {
    /// Image identifier
    pub image_id: String,
    /// Original filename
    pub filename: Option<String>,
    /// MIME type
    pub content_type: Option<String>,
    /// Unix timestamp of creation
    pub created_at: Option<i64>,
    /// Upload status
    pub status: ImageStatus,
    /// Download details for uploaded images
    #[serde(flatten)]
    pub download: Option<DownloadInfo>,
}

/// Listing response
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Records of this page that passed the filters
    pub items: Vec<ListedImage>,
    /// Number of items
    pub count: usize,
    /// Lifetime of the signed URLs, in seconds
    pub expires_in: u64,
    /// Token for the next page, present when the table has more rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Lists one page of a user's images
#[instrument(skip_all, fields(user_id))]
pub async fn handle(service: &ImageService, event: ApiEvent) -> HandlerResponse {
    match list_images(service, &event).await {
        Ok(response) => HandlerResponse::ok(&response),
        Err(e) => e.into(),
    }
}

async fn list_images(
    service: &ImageService,
    event: &ApiEvent,
) -> Result<ListResponse, HandlerError> {
    let request: ListRequest = event.payload()?;
    let user_id =
        non_empty(request.user_id).ok_or(HandlerError::Validation("user_id is required"))?;
    tracing::Span::current().record("user_id", user_id.as_str());

    let query = ImageQuery {
        user_id,
        filename_contains: non_empty(request.filename),
        content_type: non_empty(request.content_type),
        limit: service.settings.page_size,
        exclusive_start_key: non_empty(request.page_token)
            .as_deref()
            .and_then(page_token::decode),
    };

    debug!("Querying image records: {query:?}");
    let page = service.table.query(&query).await?;

    let mut items = Vec::with_capacity(page.records.len());
    for record in page.records {
        items.push(listed_image(service, record).await);
    }

    Ok(ListResponse {
        count: items.len(),
        items,
        expires_in: service.settings.presign_expiry_secs,
        next_page_token: page.last_evaluated_key.as_ref().map(page_token::encode),
    })
}

async fn listed_image(service: &ImageService, record: ImageRecord) -> ListedImage {
    let download = match record.stored_object_key() {
        Some(key) if record.is_uploaded() => {
            let signed_url = match service
                .store
                .presign_get(key, service.settings.presign_expiry())
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    error!("Failed to presign download for {key}: {e}");
                    None
                }
            };

            Some(DownloadInfo {
                bucket: record
                    .bucket
                    .clone()
                    .filter(|b| !b.is_empty())
                    .unwrap_or_else(|| service.store.bucket().to_string()),
                s3_key: key.to_string(),
                signed_url,
            })
        }
        _ => None,
    };

    ListedImage {
        image_id: record.image_id,
        filename: record.filename,
        content_type: record.content_type,
        created_at: record.created_at,
        status: record.status,
        download,
    }
}
