//! Contact Relay - a contact form backend that relays submissions by email.
//!
//! A single `POST /api/contact` endpoint validates a submission and delivers
//! it as a notification to the site owner (plus an optional acknowledgment to
//! the submitter) over the first configured transport that works.
//!
//! # Architecture
//!
//! - **domain**: Validated contact submission and email address value objects
//! - **models**: Outbound messages and delivery outcomes
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables
//! - **transports**: The `Transport` capability and the SMTP relay adapter
//! - **client**: HTTP client and transport for the transactional email API
//! - **services**: Delivery orchestration with fallback
//! - **metrics**: Delivery counters
//! - **server**: axum router and handlers

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod services;
pub mod transports;

pub use client::{EmailApiClient, EmailApiTransport};
pub use config::{Config, DeliveryPolicy, EmailApiConfig, SmtpConfig, SmtpSecurity};
pub use domain::{ContactRequest, EmailAddress, ValidationError, ValidationRules};
pub use error::{ConfigError, ContactError, TransportError};
pub use metrics::{Metrics, MetricsSummary};
pub use models::{DeliveryOutcome, MessageComposer, MessageKind, OutboundMessage, SentReceipt};
pub use server::{router, AppState};
pub use services::DeliveryOrchestrator;
pub use transports::{SmtpTransport, Transport, TransportKind};
