//! Data models for outbound mail and delivery results.
//!
//! This module contains the messages handed to transports and the
//! request-scoped outcome the orchestrator reports back.

pub mod outbound;
pub mod outcome;

pub use outbound::{html_escape, MessageComposer, MessageKind, OutboundMessage};
pub use outcome::{DeliveryOutcome, SentReceipt};
