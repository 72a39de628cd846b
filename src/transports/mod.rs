//! Email transports.
//!
//! A transport is a capability that takes one [`OutboundMessage`] and either
//! delivers it or reports why it could not. Transports hold no per-request
//! state, so one instance is shared by every request through an `Arc`.

mod smtp;

pub use smtp::SmtpTransport;

use crate::error::TransportResult;
use crate::models::{OutboundMessage, SentReceipt};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// The kinds of transport the relay knows how to build from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// SMTP relay
    Smtp,
    /// Transactional email HTTP API
    EmailApi,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smtp => write!(f, "smtp"),
            Self::EmailApi => write!(f, "email_api"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "email_api" | "emailjs" | "api" => Ok(Self::EmailApi),
            other => Err(format!(
                "Unknown transport '{}', expected smtp or email_api",
                other
            )),
        }
    }
}

/// A mechanism for delivering one email.
///
/// Implementations map every failure to a [`crate::error::TransportError`];
/// they never panic on remote errors. Time bounds are applied by the caller
/// as well, so an implementation that hangs is still cut off.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name used in logs and outcomes.
    fn name(&self) -> &str;

    /// Deliver a single message.
    async fn send(&self, message: &OutboundMessage) -> TransportResult<SentReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_round_trip_names() {
        assert_eq!(TransportKind::Smtp.to_string(), "smtp");
        assert_eq!(TransportKind::EmailApi.to_string(), "email_api");
        assert_eq!("SMTP".parse::<TransportKind>(), Ok(TransportKind::Smtp));
        assert_eq!("emailjs".parse::<TransportKind>(), Ok(TransportKind::EmailApi));
        assert!("fax".parse::<TransportKind>().is_err());
    }
}
