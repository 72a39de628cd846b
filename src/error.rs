//! Error types for the contact relay.
//!
//! This module defines custom error types using `thiserror` for precise error handling.
//! Input validation errors live with the domain types in [`crate::domain::errors`].

use crate::domain::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when a single transport tries to deliver a message.
///
/// These are recovered locally by the orchestrator, which moves on to the next
/// configured transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The SMTP relay rejected the message or the session failed
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// Could not reach the remote service
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The email API returned a non-2xx status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP request failed before a status was received
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The attempt exceeded its time budget
    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The message could not be turned into something the transport accepts
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The blocking worker running the request panicked or was cancelled
    #[error("Task join error: {0}")]
    Task(String),
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    /// Delivery cannot be attempted: no transport has complete credentials
    /// or the receiver address is absent
    #[error("Email delivery is not configured (missing: {})", .missing.join(", "))]
    Unconfigured { missing: Vec<String> },
}

/// Errors surfaced at the request boundary.
///
/// Every variant maps to a JSON response; see the `IntoResponse` impl in
/// [`crate::server::handlers`].
#[derive(Error, Debug)]
pub enum ContactError {
    /// Client input was malformed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Delivery is impossible with the current configuration
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Every configured transport failed; `cause` is the last error seen
    #[error("All transports failed (last: {transport}): {cause}")]
    AllTransportsFailed { transport: String, cause: String },

    /// Delivery did not finish within the request time budget
    #[error("Request timed out after {}ms", .0.as_millis())]
    RequestTimeout(Duration),
}

/// Convenience type alias for Results with TransportError
pub type TransportResult<T> = Result<T, TransportError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience type alias for Results with ContactError
pub type ContactResult<T> = Result<T, ContactError>;
