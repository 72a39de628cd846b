//! Domain value objects and types.
//!
//! This module contains the validated contact form submission and the
//! type-safe email address it carries. Validation happens at construction
//! time so that invalid input never reaches a transport.

pub mod contact_request;
pub mod email;
pub mod errors;

pub use contact_request::{ContactRequest, RawContactForm, ValidationRules};
pub use email::EmailAddress;
pub use errors::ValidationError;
