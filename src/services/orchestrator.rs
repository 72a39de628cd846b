//! Delivery orchestration: primary transport, fallback, result aggregation.

use crate::client::EmailApiTransport;
use crate::config::{Config, DeliveryPolicy};
use crate::domain::ContactRequest;
use crate::error::{ConfigError, ContactResult, TransportError, TransportResult};
use crate::metrics::{Metrics, SendTimer};
use crate::models::{DeliveryOutcome, MessageComposer, OutboundMessage, SentReceipt};
use crate::transports::{SmtpTransport, Transport, TransportKind};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Delivers a contact submission over the configured transports.
///
/// Transports are tried in order and the first one that accepts the
/// notification short-circuits the rest. The acknowledgment, when enabled,
/// goes out on that same transport. Each send is bounded by
/// [`DeliveryPolicy::transport_timeout`] and there are no retries beyond
/// moving on to the next transport.
pub struct DeliveryOrchestrator {
    transports: Vec<Arc<dyn Transport>>,
    composer: Option<MessageComposer>,
    policy: DeliveryPolicy,
    /// Configuration keys whose absence limits delivery
    missing: Vec<String>,
    metrics: Metrics,
}

impl DeliveryOrchestrator {
    /// Create an orchestrator over explicit transports.
    ///
    /// `composer` is `None` when no receiver address is configured, in which
    /// case every delivery fails with a configuration error.
    pub fn new(
        transports: Vec<Arc<dyn Transport>>,
        composer: Option<MessageComposer>,
        policy: DeliveryPolicy,
        metrics: Metrics,
    ) -> Self {
        Self {
            transports,
            composer,
            policy,
            missing: Vec::new(),
            metrics,
        }
    }

    /// Record configuration keys to report when delivery is impossible.
    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.missing = missing;
        self
    }

    /// Build the transports named by `config`, in trial order.
    ///
    /// A transport that fails to initialise is logged and skipped.
    pub fn from_config(config: &Config, metrics: Metrics) -> Self {
        let mut transports: Vec<Arc<dyn Transport>> = Vec::new();
        let mut missing = config.missing.clone();

        for kind in config.enabled_transports() {
            match kind {
                TransportKind::Smtp => {
                    let Some(smtp) = &config.smtp else { continue };
                    match SmtpTransport::new(smtp) {
                        Ok(transport) => transports.push(Arc::new(transport)),
                        Err(e) => {
                            error!(
                                host = %smtp.host,
                                error = %e,
                                "Failed to initialise SMTP transport"
                            );
                            missing.push("SMTP_HOST".to_string());
                        }
                    }
                }
                TransportKind::EmailApi => {
                    let Some(api) = &config.email_api else { continue };
                    transports.push(Arc::new(EmailApiTransport::from_config(api)));
                }
            }
        }

        let composer = config.receiver_email.as_ref().map(|receiver| {
            let sender = config
                .sender_email
                .clone()
                .unwrap_or_else(|| receiver.clone());
            MessageComposer::new(sender, &config.sender_name, receiver, &config.subject_prefix)
        });

        Self::new(transports, composer, config.policy, metrics).with_missing(missing)
    }

    /// Names of the active transports, in trial order.
    pub fn transport_names(&self) -> Vec<&str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Deliver one validated submission.
    ///
    /// Returns `Ok(Failed { .. })` when every transport failed; the caller
    /// decides how to surface it. Returns `Err` only when delivery cannot be
    /// attempted at all, in which case no network call is made.
    pub async fn deliver(&self, request: &ContactRequest) -> ContactResult<DeliveryOutcome> {
        let composer = match (&self.composer, self.transports.is_empty()) {
            (Some(composer), false) => composer,
            (composer, _) => {
                let mut missing = self.missing.clone();
                if missing.is_empty() {
                    if composer.is_none() {
                        missing.push("RECEIVER_EMAIL".to_string());
                    }
                    if self.transports.is_empty() {
                        missing.push("transport credentials".to_string());
                    }
                }
                error!(missing = ?missing, "Email delivery is not configured");
                return Err(ConfigError::Unconfigured { missing }.into());
            }
        };

        let notification = composer.notification(request);
        let acknowledgment = self
            .policy
            .send_acknowledgment
            .then(|| composer.acknowledgment(request));

        let mut last_failure: Option<(&str, TransportError)> = None;

        for (index, transport) in self.transports.iter().enumerate() {
            let name = transport.name();

            let receipt = match self.attempt(transport.as_ref(), &notification).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    warn!(transport = name, error = %e, "Notification send failed");
                    last_failure = Some((name, e));
                    continue;
                }
            };

            let fallback_used = index > 0;
            if fallback_used {
                self.metrics.record_fallback();
                info!(
                    transport = name,
                    failed = ?last_failure.as_ref().map(|(n, _)| *n),
                    "Delivered via fallback transport"
                );
            }
            debug!(transport = name, detail = %receipt.detail, "Notification accepted");

            let mut count = 1;
            let mut partial = false;

            if let Some(ack) = &acknowledgment {
                match self.attempt(transport.as_ref(), ack).await {
                    Ok(_) => count += 1,
                    Err(e) if self.policy.require_acknowledgment => {
                        // The owner already has the notification; falling back
                        // would deliver it twice.
                        error!(transport = name, error = %e, "Required acknowledgment failed");
                        self.metrics.record_delivery_failure();
                        return Ok(DeliveryOutcome::Failed {
                            transport: name.to_string(),
                            cause: format!("Acknowledgment failed: {}", e),
                        });
                    }
                    Err(e) => {
                        warn!(
                            transport = name,
                            error = %e,
                            "Acknowledgment send failed, partial delivery"
                        );
                        self.metrics.record_partial_delivery();
                        partial = true;
                    }
                }
            }

            info!(transport = name, count, fallback_used, partial, "Contact message delivered");
            return Ok(DeliveryOutcome::Sent {
                transport: name.to_string(),
                count,
                fallback_used,
                partial,
            });
        }

        self.metrics.record_delivery_failure();
        let (transport, cause) = match last_failure {
            Some((name, e)) => (name.to_string(), e.to_string()),
            None => ("none".to_string(), "No transport attempted".to_string()),
        };
        error!(transport = %transport, cause = %cause, "All transports failed");

        Ok(DeliveryOutcome::Failed { transport, cause })
    }

    /// One bounded send on one transport.
    async fn attempt(
        &self,
        transport: &dyn Transport,
        message: &OutboundMessage,
    ) -> TransportResult<SentReceipt> {
        let timeout = self.policy.transport_timeout;
        let timer = SendTimer::new(self.metrics.clone());

        let result = match tokio::time::timeout(timeout, transport.send(message)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        };

        let elapsed = timer.complete(result.is_ok());
        debug!(
            transport = transport.name(),
            kind = %message.kind,
            elapsed_ms = elapsed.as_millis() as u64,
            ok = result.is_ok(),
            "Send attempt finished"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawContactForm, ValidationRules};

    fn request() -> ContactRequest {
        ContactRequest::validate(
            RawContactForm {
                name: Some("Ana".to_string()),
                email: Some("ana@x.com".to_string()),
                subject: Some("Hello".to_string()),
                message: Some("Hello there".to_string()),
            },
            &ValidationRules::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_from_config_without_credentials_reports_missing_keys() {
        let config = Config::default();
        let orchestrator = DeliveryOrchestrator::from_config(
            &Config {
                missing: vec!["EMAIL_USER".to_string(), "RECEIVER_EMAIL".to_string()],
                ..config
            },
            Metrics::new(),
        );
        assert!(orchestrator.transport_names().is_empty());

        let err = orchestrator.deliver(&request()).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("missing"));
        assert!(text.contains("EMAIL_USER"));
        assert_eq!(orchestrator.metrics().send_attempts_total(), 0);
    }

    #[tokio::test]
    async fn test_from_config_orders_transports() {
        let config = Config::from_lookup(|key| {
            match key {
                "EMAIL_USER" => Some("u@example.com"),
                "EMAIL_PASS" => Some("p"),
                "EMAILJS_SERVICE_ID" => Some("s"),
                "EMAILJS_TEMPLATE_ID" => Some("t"),
                "EMAILJS_PUBLIC_KEY" => Some("k"),
                "RECEIVER_EMAIL" => Some("owner@example.com"),
                "TRANSPORT_ORDER" => Some("email_api,smtp"),
                _ => None,
            }
            .map(str::to_string)
        })
        .unwrap();

        let orchestrator = DeliveryOrchestrator::from_config(&config, Metrics::new());
        assert_eq!(orchestrator.transport_names(), vec!["email_api", "smtp"]);
    }

    #[tokio::test]
    async fn test_missing_receiver_is_configuration_error() {
        let orchestrator = DeliveryOrchestrator::new(
            Vec::new(),
            None,
            DeliveryPolicy::default(),
            Metrics::new(),
        );
        let err = orchestrator.deliver(&request()).await.unwrap_err();
        assert!(err.to_string().contains("RECEIVER_EMAIL"));
    }
}
