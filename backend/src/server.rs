use std::time::Duration;

use axum::Extension;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{handlers::ImageService, routes};

/// Builds the application router with its layers
#[must_use]
pub fn router(service: ImageService) -> axum::Router {
    routes::handler()
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

/// Starts the server with the given service context
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(service: ImageService) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Image Service started on http://{addr}");

    axum::serve(listener, router(service).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
