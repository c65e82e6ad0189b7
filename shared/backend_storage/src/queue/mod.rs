//! Queue operations for the image service
//!
//! The arrival queue receives S3 `ObjectCreated` notifications for the image bucket.

/// Arrival notification queue
pub mod arrival;
/// Error types for queue operations
pub mod error;
/// Common types for queue operations
pub mod types;

pub use arrival::{ArrivalQueue, NotificationQueue};
pub use error::{QueueError, QueueResult};
pub use types::{QueueConfig, QueueMessage};
