//! Contact form validation errors.

use std::fmt;

/// Errors that can occur while validating a contact form submission.
///
/// Every variant is a client error and is answered with HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The request body is not a JSON object of string fields.
    MalformedBody(String),

    /// A required field is absent or blank.
    MissingField(&'static str),

    /// A field is shorter than its minimum length.
    TooShort { field: &'static str, min: usize },

    /// A field exceeds its maximum length.
    TooLong { field: &'static str, max: usize },

    /// The provided email address is invalid.
    InvalidEmail(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedBody(reason) => write!(f, "Malformed request body: {}", reason),
            Self::MissingField(field) => write!(f, "Missing required field: {}", field),
            Self::TooShort { field, min } => {
                write!(f, "Field '{}' must be at least {} characters", field, min)
            }
            Self::TooLong { field, max } => {
                write!(f, "Field '{}' must be at most {} characters", field, max)
            }
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
        }
    }
}

impl std::error::Error for ValidationError {}
