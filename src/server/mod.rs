//! REST surface for the generation service.
//!
//! A thin axum layer over the library: handlers validate and decode the
//! request, call into [`crate::generate`] / the clients, and translate
//! errors into the common `{success:false, error, detail, traceback}`
//! shape. Generated images are served back from the output directory
//! under `/static/generated`, so the URLs minted by the pipeline resolve
//! against the same server.
//!
//! Enabled by the `server` cargo feature together with the
//! `wedcard-server` binary.

pub mod handlers;
pub mod types;

use crate::config::WedcardConfig;
use crate::error::WedcardError;
use crate::pipeline::storage::ImageStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared server state: just the immutable config.
///
/// Per-request client construction keeps the state free of connection
/// caches; reqwest pools connections internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WedcardConfig>,
}

/// Uploaded photos can be several megabytes each; 25 MB covers two
/// full-resolution phone photos with room to spare.
const BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;

/// Build the application router.
pub fn router(config: Arc<WedcardConfig>) -> Router {
    let output_dir = config.output_dir.clone();
    let state = AppState { config };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/generate-text", post(handlers::generate_text))
        .route("/api/generate-invitation", post(handlers::generate_invitation))
        .route(
            "/api/generate-invitation-test",
            post(handlers::generate_invitation_test),
        )
        .route("/api/generate-3d", post(handlers::generate_3d))
        .route("/api/status/{task_id}", get(handlers::task_status))
        .nest_service(ImageStore::MOUNT, ServeDir::new(output_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: WedcardConfig, addr: SocketAddr) -> Result<(), WedcardError> {
    let app = router(Arc::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| WedcardError::Internal(format!("bind {addr}: {e}")))?;
    info!(%addr, "wedcard server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| WedcardError::Internal(format!("server: {e}")))
}
