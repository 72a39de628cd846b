//! Contact form submission and its validation rules.

use super::email::EmailAddress;
use super::errors::ValidationError;
use serde::Deserialize;

/// The request body exactly as submitted.
///
/// Every field is optional here so that a missing field can be reported by
/// name instead of as a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContactForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RawContactForm {
    /// Parse a raw JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::MalformedBody(
                "request body is empty".to_string(),
            ));
        }
        serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))
    }
}

/// Length limits applied to each field, counted in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_name_len: usize,
    pub min_email_len: usize,
    pub min_subject_len: usize,
    pub min_message_len: usize,
    pub max_name_len: usize,
    pub max_email_len: usize,
    pub max_subject_len: usize,
    pub max_message_len: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_name_len: 2,
            min_email_len: 5,
            min_subject_len: 3,
            min_message_len: 5,
            max_name_len: 256,
            max_email_len: 254,
            max_subject_len: 256,
            max_message_len: 10_000,
        }
    }
}

/// A validated contact form submission.
///
/// Only obtainable through [`ContactRequest::validate`], so holding one means
/// every field passed its rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRequest {
    pub name: String,
    pub email: EmailAddress,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    /// Validate a raw submission against `rules`.
    ///
    /// Fields are checked in form order (name, email, subject, message) and the
    /// first failure is returned.
    pub fn validate(raw: RawContactForm, rules: &ValidationRules) -> Result<Self, ValidationError> {
        let name = check_field("name", raw.name, rules.min_name_len, rules.max_name_len)?;
        let email = check_field("email", raw.email, rules.min_email_len, rules.max_email_len)?;
        let email = EmailAddress::new(email)?;
        let subject = check_field(
            "subject",
            raw.subject,
            rules.min_subject_len,
            rules.max_subject_len,
        )?;
        let message = check_field(
            "message",
            raw.message,
            rules.min_message_len,
            rules.max_message_len,
        )?;

        Ok(Self {
            name,
            email,
            subject,
            message,
        })
    }

    /// Parse and validate a JSON request body in one step.
    pub fn from_json(body: &[u8], rules: &ValidationRules) -> Result<Self, ValidationError> {
        Self::validate(RawContactForm::from_json(body)?, rules)
    }
}

fn check_field(
    field: &'static str,
    value: Option<String>,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }

    let len = trimmed.chars().count();
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(trimmed.to_string())
}
