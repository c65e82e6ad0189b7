use std::collections::HashMap;

use axum::{body::Bytes, extract::Query, Extension};

use crate::{
    handlers::{deletion, listing, upload, ImageService},
    types::{ApiEvent, HandlerResponse},
};

pub async fn create_upload_url(
    Extension(service): Extension<ImageService>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> HandlerResponse {
    upload::handle(&service, ApiEvent::from_parts(query, &body)).await
}

pub async fn list_images(
    Extension(service): Extension<ImageService>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> HandlerResponse {
    listing::handle(&service, ApiEvent::from_parts(query, &body)).await
}

pub async fn delete_image(
    Extension(service): Extension<ImageService>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> HandlerResponse {
    deletion::handle(&service, ApiEvent::from_parts(query, &body)).await
}
