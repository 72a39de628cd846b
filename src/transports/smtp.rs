//! SMTP relay transport built on lettre.

use super::Transport;
use crate::config::{SmtpConfig, SmtpSecurity};
use crate::error::{TransportError, TransportResult};
use crate::models::{OutboundMessage, SentReceipt};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Sends mail through an authenticated SMTP relay.
///
/// The connection timeout configured here covers connect, greeting and every
/// socket read, so a silent relay cannot hold a request open.
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    verify_connection: bool,
}

impl SmtpTransport {
    /// Create a transport from configuration. No connection is opened yet.
    pub fn new(config: &SmtpConfig) -> TransportResult<Self> {
        let builder = match config.security {
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| TransportError::Smtp(e.to_string()))?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::Smtp(e.to_string()))?,
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            }
        };

        let mailer = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();

        tracing::debug!(
            host = %config.host,
            port = config.port,
            security = ?config.security,
            "SMTP transport configured"
        );

        Ok(Self {
            mailer,
            host: config.host.clone(),
            verify_connection: config.verify_connection,
        })
    }

    /// Check that the relay accepts connections.
    pub async fn verify(&self) -> TransportResult<()> {
        match self.mailer.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Connection(format!(
                "{} did not accept the connection",
                self.host
            ))),
            Err(e) => Err(map_error(e)),
        }
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, message: &OutboundMessage) -> TransportResult<SentReceipt> {
        let email = build_message(message)?;

        if self.verify_connection {
            self.verify().await?;
        }

        let response = self.mailer.send(email).await.map_err(map_error)?;
        let detail = match response.first_line() {
            Some(line) => format!("{} {}", response.code(), line),
            None => response.code().to_string(),
        };

        Ok(SentReceipt::new(self.name(), detail))
    }
}

/// Turn an outbound message into a MIME message with HTML and plain-text parts.
pub(crate) fn build_message(message: &OutboundMessage) -> TransportResult<Message> {
    let from = Mailbox::new(
        Some(message.from_name.clone()).filter(|n| !n.is_empty()),
        parse_address("from", &message.from)?,
    );
    let to = Mailbox::new(None, parse_address("to", &message.to)?);
    let reply_to = Mailbox::new(None, parse_address("reply-to", &message.reply_to)?);

    Message::builder()
        .from(from)
        .to(to)
        .reply_to(reply_to)
        .subject(message.subject.clone())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(message.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(message.html_body.clone()),
                ),
        )
        .map_err(|e| TransportError::InvalidMessage(format!("Failed to build email: {}", e)))
}

fn parse_address(header: &str, value: &str) -> TransportResult<Address> {
    value.parse::<Address>().map_err(|e| {
        TransportError::InvalidMessage(format!("Invalid {} address '{}': {}", header, value, e))
    })
}

/// Replies from the server are SMTP errors; everything else is a connection problem.
fn map_error(error: lettre::transport::smtp::Error) -> TransportError {
    if error.is_permanent() || error.is_transient() {
        TransportError::Smtp(error.to_string())
    } else {
        TransportError::Connection(error.to_string())
    }
}
