//! Contact Relay - Main entry point
//!
//! Loads configuration, builds the configured transports and serves the
//! contact form API until a shutdown signal arrives.

use anyhow::{Context, Result};
use contact_relay::server::{self, AppState};
use contact_relay::{Config, DeliveryOrchestrator, Metrics};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so LOG_LEVEL can seed the filter
    let config = Config::from_env();

    let default_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match config {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let metrics = Metrics::new();
    let orchestrator = DeliveryOrchestrator::from_config(&config, metrics.clone());

    let transports = orchestrator.transport_names();
    if transports.is_empty() {
        warn!(
            missing = ?config.missing,
            "No email transport configured; contact submissions will fail"
        );
    } else {
        info!(transports = ?transports, "Email transports ready");
        if !config.missing.is_empty() {
            info!(missing = ?config.missing, "Some transports are disabled");
        }
    }
    info!(
        send_acknowledgment = config.policy.send_acknowledgment,
        require_acknowledgment = config.policy.require_acknowledgment,
        mask_failures_as_success = config.policy.mask_failures_as_success,
        transport_timeout_secs = config.policy.transport_timeout.as_secs(),
        "Delivery policy"
    );

    let state = AppState::new(Arc::new(orchestrator), config.validation);
    let app = server::router(state, config.request_timeout);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Contact relay listening on {}", address);

    server::run_server(listener, app).await?;

    info!(metrics = ?metrics.summary(), "Contact relay shutdown complete");
    Ok(())
}
