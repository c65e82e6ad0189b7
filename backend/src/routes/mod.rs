mod events;
mod health;
mod images;

use axum::{
    routing::{get, post},
    Router,
};

/// Creates the router with all handler routes
pub fn handler() -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .route("/v1/images/upload-urls", post(images::create_upload_url))
        .route(
            "/v1/images",
            get(images::list_images).delete(images::delete_image),
        )
        .route("/v1/events/object-created", post(events::object_created))
}
