use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use backend::{
    handlers::{ImageService, ServiceSettings},
    server,
    testing::{fake_service, FakeObjectStore, InMemoryImageTable},
};
use tower::ServiceExt;

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Handlers wired to in-memory collaborators
pub struct TestContext {
    pub service: ImageService,
    pub table: Arc<InMemoryImageTable>,
    pub store: Arc<FakeObjectStore>,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(ServiceSettings::default())
    }

    pub fn with_settings(settings: ServiceSettings) -> Self {
        setup_test_env();

        let (service, table, store) = fake_service(settings);
        let router = server::router(service.clone());

        Self {
            service,
            table,
            store,
            router,
        }
    }

    pub async fn send_request(
        &self,
        method: &str,
        route: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let builder = Request::builder().uri(route).method(method);
        let request = match payload {
            Some(payload) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
