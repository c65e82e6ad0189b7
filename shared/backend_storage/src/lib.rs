//! Storage services for the image service
//!
//! This crate provides the collaborators the request handlers are built on:
//! the image metadata table, the object bucket, and the arrival notification queue.

/// S3 object operations
pub mod bucket;
/// Image record table operations
pub mod image_record;
/// SQS queue operations
pub mod queue;
