//! Arrival worker: drains S3 arrival notifications from SQS into the image table

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod health;
pub mod worker;
