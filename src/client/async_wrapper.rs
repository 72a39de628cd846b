//! Async transport around the synchronous EmailApiClient.
//!
//! Uses `tokio::task::spawn_blocking` to run the HTTP call on the blocking
//! thread pool, preventing it from stalling the async runtime.

use crate::client::EmailApiClient;
use crate::config::EmailApiConfig;
use crate::error::{TransportError, TransportResult};
use crate::models::{OutboundMessage, SentReceipt};
use crate::transports::Transport;
use async_trait::async_trait;
use std::sync::Arc;

/// Transport that delivers through the transactional email API.
#[derive(Clone)]
pub struct EmailApiTransport {
    client: Arc<EmailApiClient>,
}

impl EmailApiTransport {
    pub fn new(client: EmailApiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn from_config(config: &EmailApiConfig) -> Self {
        Self::new(EmailApiClient::new(config))
    }
}

#[async_trait]
impl Transport for EmailApiTransport {
    fn name(&self) -> &str {
        "email_api"
    }

    async fn send(&self, message: &OutboundMessage) -> TransportResult<SentReceipt> {
        let client = self.client.clone();
        let message = message.clone();

        let body = tokio::task::spawn_blocking(move || client.send(&message))
            .await
            .map_err(|e| TransportError::Task(e.to_string()))??;

        Ok(SentReceipt::new(self.name(), body.trim()))
    }
}
