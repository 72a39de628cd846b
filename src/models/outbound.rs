//! Outbound email messages derived from a contact submission.

use crate::domain::ContactRequest;
use serde::Serialize;
use std::fmt;

/// Which of the two per-request emails a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Sent to the site owner with the full submission.
    Notification,
    /// Sent back to the submitter confirming receipt.
    Acknowledgment,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notification => write!(f, "notification"),
            Self::Acknowledgment => write!(f, "acknowledgment"),
        }
    }
}

/// A fully addressed email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub kind: MessageKind,
    /// Display name used in the From header
    pub from_name: String,
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html_body: String,
    /// Plain-text alternative of `html_body`
    pub text_body: String,
    /// Name of the person who filled in the form
    pub contact_name: String,
}

/// Builds outbound messages from a validated submission and the configured
/// addresses. Composition is deterministic: the same inputs always produce
/// the same messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageComposer {
    sender: String,
    sender_name: String,
    receiver: String,
    subject_prefix: String,
}

impl MessageComposer {
    pub fn new(
        sender: impl Into<String>,
        sender_name: impl Into<String>,
        receiver: impl Into<String>,
        subject_prefix: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            sender_name: sender_name.into(),
            receiver: receiver.into(),
            subject_prefix: subject_prefix.into(),
        }
    }

    /// Message to the site owner carrying the full submission.
    pub fn notification(&self, request: &ContactRequest) -> OutboundMessage {
        let subject = if self.subject_prefix.is_empty() {
            request.subject.clone()
        } else {
            format!("{}: {}", self.subject_prefix, request.subject)
        };

        let html_body = format!(
            "<h2>New Message from {name}</h2>\
             <p><strong>Email:</strong> {email}</p>\
             <p><strong>Subject:</strong> {subject}</p>\
             <p>{message}</p>",
            name = html_escape(&request.name),
            email = html_escape(request.email.as_str()),
            subject = html_escape(&request.subject),
            message = paragraph(&request.message),
        );

        let text_body = format!(
            "New message from {} <{}>\nSubject: {}\n\n{}",
            request.name, request.email, request.subject, request.message
        );

        OutboundMessage {
            kind: MessageKind::Notification,
            from_name: self.sender_name.clone(),
            from: self.sender.clone(),
            to: self.receiver.clone(),
            reply_to: request.email.as_str().to_string(),
            subject,
            html_body,
            text_body,
            contact_name: request.name.clone(),
        }
    }

    /// Confirmation sent back to the submitter.
    pub fn acknowledgment(&self, request: &ContactRequest) -> OutboundMessage {
        let html_body = format!(
            "<h2>Thanks for reaching out, {name}!</h2>\
             <p>Your message has been received and I will get back to you soon.</p>\
             <hr>\
             <p><strong>Subject:</strong> {subject}</p>\
             <p>{message}</p>",
            name = html_escape(&request.name),
            subject = html_escape(&request.subject),
            message = paragraph(&request.message),
        );

        let text_body = format!(
            "Thanks for reaching out, {}!\n\n\
             Your message has been received and I will get back to you soon.\n\n\
             Subject: {}\n\n{}",
            request.name, request.subject, request.message
        );

        OutboundMessage {
            kind: MessageKind::Acknowledgment,
            from_name: self.sender_name.clone(),
            from: self.sender.clone(),
            to: request.email.as_str().to_string(),
            reply_to: self.receiver.clone(),
            subject: format!("Thanks for your message: {}", request.subject),
            html_body,
            text_body,
            contact_name: request.name.clone(),
        }
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn paragraph(text: &str) -> String {
    html_escape(text).replace('\n', "<br>")
}
