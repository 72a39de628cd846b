//! HTTP client for the transactional email API.
//!
//! This module provides a synchronous HTTP client that can be used from async contexts
//! via `tokio::task::spawn_blocking` (see [`EmailApiTransport`]). The client builds the
//! JSON payload the API expects and maps HTTP failures to [`TransportError`].

mod async_wrapper;
pub use async_wrapper::EmailApiTransport;

use crate::config::EmailApiConfig;
use crate::error::{TransportError, TransportResult};
use crate::models::{MessageKind, OutboundMessage};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum number of characters of a raw error body kept in diagnostics.
const ERROR_BODY_LIMIT: usize = 200;

/// Request body for the `email/send` endpoint.
#[derive(Debug, Serialize)]
pub struct SendEmailRequest<'a> {
    pub service_id: &'a str,
    pub template_id: &'a str,
    /// The account's public key
    pub user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<&'a str>,
    pub template_params: TemplateParams<'a>,
}

/// Variables made available to the email template.
#[derive(Debug, Serialize)]
pub struct TemplateParams<'a> {
    pub kind: MessageKind,
    pub to_email: &'a str,
    pub from_email: &'a str,
    pub from_name: &'a str,
    pub reply_to: &'a str,
    pub contact_name: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
    pub html_body: &'a str,
}

/// HTTP client for the transactional email API.
///
/// This client uses `ureq` for synchronous HTTP requests and can be called
/// from async contexts using `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct EmailApiClient {
    endpoint: String,
    service_id: String,
    template_id: String,
    ack_template_id: Option<String>,
    public_key: String,
    private_key: Option<String>,
    timeout: Duration,

    /// HTTP client agent
    agent: Arc<ureq::Agent>,
}

impl EmailApiClient {
    /// Create a new EmailApiClient from configuration.
    pub fn new(config: &EmailApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();

        Self {
            endpoint: config.endpoint.clone(),
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            ack_template_id: config.ack_template_id.clone(),
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
            timeout: config.timeout,
            agent: Arc::new(agent),
        }
    }

    /// Create a client posting to a custom endpoint (useful for testing).
    #[doc(hidden)]
    pub fn with_endpoint(
        endpoint: String,
        service_id: &str,
        template_id: &str,
        public_key: &str,
    ) -> Self {
        Self::new(&EmailApiConfig {
            endpoint,
            service_id: service_id.to_string(),
            template_id: template_id.to_string(),
            ack_template_id: None,
            public_key: public_key.to_string(),
            private_key: None,
            timeout: Duration::from_secs(10),
        })
    }

    /// Template used for a given message kind.
    pub fn template_for(&self, kind: MessageKind) -> &str {
        match kind {
            MessageKind::Notification => &self.template_id,
            MessageKind::Acknowledgment => self
                .ack_template_id
                .as_deref()
                .unwrap_or(&self.template_id),
        }
    }

    /// Build the request payload for `message`.
    pub fn build_request<'a>(&'a self, message: &'a OutboundMessage) -> SendEmailRequest<'a> {
        SendEmailRequest {
            service_id: &self.service_id,
            template_id: self.template_for(message.kind),
            user_id: &self.public_key,
            access_token: self.private_key.as_deref(),
            template_params: TemplateParams {
                kind: message.kind,
                to_email: &message.to,
                from_email: &message.from,
                from_name: &message.from_name,
                reply_to: &message.reply_to,
                contact_name: &message.contact_name,
                subject: &message.subject,
                message: &message.text_body,
                html_body: &message.html_body,
            },
        }
    }

    /// Post one message to the API. Blocks the calling thread.
    ///
    /// Returns the response body on success.
    pub fn send(&self, message: &OutboundMessage) -> TransportResult<String> {
        let start = Instant::now();
        let body = serde_json::to_value(self.build_request(message))
            .map_err(|e| TransportError::InvalidMessage(e.to_string()))?;

        tracing::debug!(endpoint = %self.endpoint, kind = %message.kind, "POST email API");

        let result = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| self.map_error(e))
            .and_then(|response| {
                let status = response.status();
                let text = response
                    .into_string()
                    .map_err(|e| TransportError::Http(e.to_string()))?;
                if (200..300).contains(&status) {
                    Ok(text)
                } else {
                    Err(TransportError::Api {
                        status,
                        message: describe_error_body(&text),
                    })
                }
            });

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(elapsed_ms, "Email API accepted message"),
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "Email API request failed"),
        }

        result
    }

    /// Map a ureq error to a TransportError.
    fn map_error(&self, error: ureq::Error) -> TransportError {
        match error {
            ureq::Error::Status(status, response) => {
                let body = response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                TransportError::Api {
                    status,
                    message: describe_error_body(&body),
                }
            }
            ureq::Error::Transport(transport) => match transport.kind() {
                ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns => {
                    TransportError::Connection(transport.to_string())
                }
                ureq::ErrorKind::Io if is_timeout(&transport) => {
                    TransportError::Timeout(self.timeout)
                }
                ureq::ErrorKind::Io => TransportError::Connection(transport.to_string()),
                _ => TransportError::Http(transport.to_string()),
            },
        }
    }
}

/// Whether an I/O failure was the socket timeout firing, as opposed to a reset
/// or early close by the peer.
fn is_timeout(transport: &ureq::Transport) -> bool {
    std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(|e| {
            matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        })
}

/// Extract a diagnostic message from an error response body.
///
/// JSON bodies are searched for a `message`, `error` or `text` string field;
/// anything else is returned as raw text truncated to a fixed length.
pub fn describe_error_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let found = ["message", "error", "text"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()));
        if let Some(message) = found {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "Empty response body".to_string();
    }
    if trimmed.chars().count() > ERROR_BODY_LIMIT {
        let truncated: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{}...", truncated)
    } else {
        trimmed.to_string()
    }
}
