//! HTTP and WebSocket surface
//!
//! # Endpoints
//!
//! - `POST /login` - exchange credentials for a bearer token
//! - `GET /stories?page=&limit=` - paginated stories, bearer token required
//! - `GET /ws` - live update socket
//! - `GET /health` - liveness and connection count

pub mod handlers;
pub mod websocket;

use crate::pipeline::context::AppContext;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;

/// Build the router with all endpoints
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/stories", get(handlers::list_stories))
        .route("/health", get(handlers::health))
        .route("/ws", get(websocket::live_updates))
        .with_state(ctx)
}

/// Resolves on CTRL+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("❌ Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("⚠️  Shutdown signal received");
}
