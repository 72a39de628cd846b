//! Delivery results.

use serde::Serialize;

/// What a transport hands back after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentReceipt {
    /// Name of the transport that accepted the message
    pub transport: String,
    /// Server response summary (SMTP reply, API body), for logging
    pub detail: String,
}

impl SentReceipt {
    pub fn new(transport: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            transport: transport.into(),
            detail: detail.into(),
        }
    }
}

/// Result of delivering one contact submission.
///
/// Created and discarded within a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent {
        transport: String,
        /// Number of messages accepted (1 or 2)
        count: usize,
        /// True when an earlier transport failed first
        fallback_used: bool,
        /// True when the notification went out but the acknowledgment did not
        partial: bool,
    },
    Failed {
        transport: String,
        cause: String,
    },
}

impl DeliveryOutcome {
    /// Name of the transport the outcome refers to.
    pub fn transport(&self) -> &str {
        match self {
            Self::Sent { transport, .. } | Self::Failed { transport, .. } => transport,
        }
    }
}
