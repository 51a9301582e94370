//! HTTP surface for the HR policy assistant.
//!
//! Routes:
//! - `GET /`       chat page
//! - `POST /chat`  `{message, history?}` → `{success, data: {answer, pages, sources}}`
//! - `GET /health` loaded index summary

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::{AppState, ConfigError, ServerConfig};
pub use crate::error_handler::AppError;

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{chat::chat_route::chat, health_route::health, index_route::index},
};

/// Builds the application router. Exposed for in-process tests.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Binds `cfg.address` and serves until Ctrl+C.
pub async fn start(state: AppState, cfg: &ServerConfig) -> Result<(), AppError> {
    let app = router(Arc::new(state));

    // Bind to address
    let listener = tokio::net::TcpListener::bind(cfg.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %cfg.address, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
