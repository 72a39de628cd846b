//! HTTP server for the contact relay.
//!
//! This module wires the handlers into an axum router and runs it until a
//! shutdown signal arrives.

pub mod handlers;

pub use handlers::{AppState, ContactResponse, HealthResponse};

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;

/// Build the router exposing `GET /api/health` and `POST /api/contact`.
///
/// `request_timeout` bounds the delivery of each submission. A request that
/// runs out of time is answered with the usual JSON failure body.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/contact", post(handlers::contact))
        .with_state(state.with_request_timeout(request_timeout))
}

/// Serve `router` on `listener` until Ctrl-C (or SIGTERM on unix).
pub async fn run_server(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
