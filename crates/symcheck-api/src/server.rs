//! Router assembly and daemon runner.

use crate::routes::{self, AppState};
use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use symcheck_kernel::SymcheckKernel;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full API router over shared state.
///
/// CORS is wide open: the service has no authentication and is meant to be
/// called from a browser frontend on another origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/analyze", post(routes::analyze))
        .route(
            "/history",
            get(routes::list_history).delete(routes::clear_history),
        )
        .route("/history/{id}", delete(routes::delete_history_entry))
        .route("/api/health", get(routes::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `listen_addr` until Ctrl-C.
pub async fn run_daemon(
    kernel: Arc<SymcheckKernel>,
    listen_addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let state = Arc::new(AppState::new(kernel.clone()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = %listener.local_addr()?, "symcheck API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    kernel.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
