use std::net::SocketAddr;

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Reports 503 once shutdown has started so the instance is drained from rotation
async fn health(State(shutdown_token): State<CancellationToken>) -> impl IntoResponse {
    let (status, state) = if shutdown_token.is_cancelled() {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting_down")
    } else {
        (StatusCode::OK, "healthy")
    };

    (
        status,
        Json(json!({
            "status": state,
            "service": "arrival-worker",
            "semver": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Health check router
#[must_use]
pub fn router(shutdown_token: CancellationToken) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(shutdown_token)
}

/// Start the health check HTTP server
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
pub async fn start_health_server(shutdown_token: CancellationToken) -> anyhow::Result<()> {
    let app = router(shutdown_token.clone());

    let addr = SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8002), |p| p.parse())?,
    ));
    let listener = TcpListener::bind(addr).await?;
    info!("Health check server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_token.cancelled().await;
        })
        .await?;

    Ok(())
}
