//! Request handlers for the image lifecycle
//!
//! Every handler takes an [`ApiEvent`](crate::types::ApiEvent) and returns a
//! [`HandlerResponse`](crate::types::HandlerResponse). Errors are converted to the
//! `{"error": ...}` envelope in exactly one place per handler.

use std::sync::Arc;
use std::time::Duration;

use backend_storage::{bucket::ObjectStore, image_record::ImageTable};

/// Records an arrival notification batch
pub mod arrival;
/// Deletes an image record and, when uploaded, its object
pub mod deletion;
/// Lists a user's images
pub mod listing;
/// Issues presigned upload URLs
pub mod upload;

/// Tunables shared by all handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Expiry of presigned upload and download URLs, in seconds
    pub presign_expiry_secs: u64,
    /// Maximum number of table rows evaluated per listing page
    pub page_size: i32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            presign_expiry_secs: 900,
            page_size: 10,
        }
    }
}

impl ServiceSettings {
    /// Presigned URL expiry as a duration
    #[must_use]
    pub const fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

/// Collaborators and settings handed to each handler invocation
#[derive(Clone)]
pub struct ImageService {
    /// Image record table
    pub table: Arc<dyn ImageTable>,
    /// Object store holding the image payloads
    pub store: Arc<dyn ObjectStore>,
    /// Handler tunables
    pub settings: ServiceSettings,
}

impl ImageService {
    /// Creates a new service context
    #[must_use]
    pub fn new(
        table: Arc<dyn ImageTable>,
        store: Arc<dyn ObjectStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            table,
            store,
            settings,
        }
    }
}

/// Treats empty strings as missing
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
