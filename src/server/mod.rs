//! JSON request layer.
//!
//! Provides two endpoints:
//! - `POST /api/wayback` - runs a domain check and returns the report chunks
//! - `GET /health` - liveness probe
//!
//! Every request shares the same [`HistoryContext`], so repeated checks of a
//! domain are served from its cache.

mod handlers;
mod types;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::context::HistoryContext;
use handlers::{health_handler, wayback_handler};
pub use types::{ApiResponse, WaybackRequest};

/// Builds the API router around `ctx`.
pub fn router(ctx: HistoryContext) -> Router {
    Router::new()
        .route("/api/wayback", post(wayback_handler))
        .route("/health", get(health_handler))
        .with_state(ctx)
}

/// Serves the API on `127.0.0.1:<port>` until `shutdown` is cancelled.
pub async fn serve(
    port: u16,
    ctx: HistoryContext,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind API server to port {}: {}", port, e))?;

    log::info!("API server listening on http://127.0.0.1:{}/", port);
    log::info!("  - Check: POST http://127.0.0.1:{}/api/wayback", port);
    log::info!("  - Health: http://127.0.0.1:{}/health", port);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

    log::info!("API server stopped");
    Ok(())
}
