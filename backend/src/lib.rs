//! Image Service backend

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Object key and pagination token codecs
pub mod codec;

/// Request handlers
pub mod handlers;

/// HTTP routes
mod routes;

/// HTTP server
pub mod server;

/// Request, response, error and configuration types
pub mod types;

/// In-memory collaborators for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
