use async_trait::async_trait;
use contact_relay::error::{TransportError, TransportResult};
use contact_relay::models::{MessageKind, OutboundMessage, SentReceipt};
use contact_relay::transports::Transport;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a mock transport answers a send.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Accept every message
    Succeed,
    /// Reject every message with the given error
    Fail(TransportError),
    /// Accept notifications, reject acknowledgments
    FailAcknowledgments,
    /// Sleep before accepting, to exercise timeouts
    Hang(Duration),
}

/// Mock transport for testing.
///
/// Records every message it accepted and every attempt it failed.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockTransport {
    name: String,
    behavior: Behavior,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failed: Arc<Mutex<Vec<OutboundMessage>>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            sent: Arc::new(Mutex::new(Vec::new())),
            failed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn succeeding(name: &str) -> Self {
        Self::new(name, Behavior::Succeed)
    }

    pub fn unreachable(name: &str) -> Self {
        Self::new(
            name,
            Behavior::Fail(TransportError::Connection("Connection refused".to_string())),
        )
    }

    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.lock().unwrap().len()
    }

    /// Total number of send attempts seen.
    pub fn call_count(&self) -> usize {
        self.sent_count() + self.failed_count()
    }

    fn record_sent(&self, message: &OutboundMessage) -> TransportResult<SentReceipt> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(SentReceipt::new(&self.name, "250 OK"))
    }

    fn record_failed(
        &self,
        message: &OutboundMessage,
        error: TransportError,
    ) -> TransportResult<SentReceipt> {
        self.failed.lock().unwrap().push(message.clone());
        Err(error)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: &OutboundMessage) -> TransportResult<SentReceipt> {
        match &self.behavior {
            Behavior::Succeed => self.record_sent(message),
            Behavior::Fail(error) => self.record_failed(message, error.clone()),
            Behavior::FailAcknowledgments => match message.kind {
                MessageKind::Notification => self.record_sent(message),
                MessageKind::Acknowledgment => self.record_failed(
                    message,
                    TransportError::Smtp("550 mailbox unavailable".to_string()),
                ),
            },
            Behavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                self.record_sent(message)
            }
        }
    }
}
