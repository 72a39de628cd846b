//! Configuration management for the contact relay.
//!
//! This module loads and validates configuration from environment variables,
//! reading a `.env` file first when one is present. A transport whose
//! credentials are absent is disabled and its keys are recorded in
//! [`Config::missing`]; only malformed values are start-up errors.

use crate::domain::ValidationRules;
use crate::error::{ConfigError, ConfigResult};
use crate::transports::TransportKind;
use std::env;
use std::time::Duration;

/// Default endpoint of the transactional email API.
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (port 587)
    StartTls,
    /// TLS from the first byte (port 465)
    Tls,
    /// No encryption; only for local relays and tests
    None,
}

/// Settings for the SMTP relay transport.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub security: SmtpSecurity,
    /// Probe the relay before each send
    pub verify_connection: bool,
    /// Bound on connect, greeting and socket reads
    pub timeout: Duration,
}

/// Settings for the transactional email API transport.
#[derive(Debug, Clone)]
pub struct EmailApiConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    /// Template for acknowledgment messages (default: `template_id`)
    pub ack_template_id: Option<String>,
    pub public_key: String,
    pub private_key: Option<String>,
    pub timeout: Duration,
}

/// How the orchestrator treats partial and total failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// Send the acknowledgment email to the submitter
    pub send_acknowledgment: bool,
    /// Report failure when the acknowledgment cannot be sent
    pub require_acknowledgment: bool,
    /// Answer an all-transports-failed outcome with a 200 success
    pub mask_failures_as_success: bool,
    /// Time budget for a single send on a single transport
    pub transport_timeout: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            send_acknowledgment: true,
            require_acknowledgment: false,
            mask_failures_as_success: false,
            transport_timeout: Duration::from_secs(15),
        }
    }
}

/// Configuration for the contact relay, built once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen host (default: "0.0.0.0")
    pub host: String,

    /// Listen port (default: 5000)
    pub port: u16,

    /// SMTP transport, `None` when credentials are absent
    pub smtp: Option<SmtpConfig>,

    /// Email API transport, `None` when credentials are absent
    pub email_api: Option<EmailApiConfig>,

    /// Site owner's inbox
    pub receiver_email: Option<String>,

    /// From address (default: SMTP user, then receiver)
    pub sender_email: Option<String>,

    /// Display name for the From header (default: "Contact Form")
    pub sender_name: String,

    /// Notification subject prefix (default: "Portfolio")
    pub subject_prefix: String,

    /// Transports in the order they are tried
    pub transport_order: Vec<TransportKind>,

    pub policy: DeliveryPolicy,

    pub validation: ValidationRules,

    /// Bound on a whole HTTP request
    pub request_timeout: Duration,

    /// Log level used when `RUST_LOG` is unset (default: "info")
    pub log_level: String,

    /// Environment variables whose absence disabled delivery capability
    pub missing: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// SMTP is enabled when `EMAIL_USER` and `EMAIL_PASS` are both set. The
    /// email API is enabled when `EMAILJS_SERVICE_ID`, `EMAILJS_TEMPLATE_ID`
    /// and `EMAILJS_PUBLIC_KEY` are all set. `RECEIVER_EMAIL` is needed for
    /// any delivery.
    ///
    /// Optional environment variables:
    /// - `HOST`, `PORT`: listen address (default: 0.0.0.0:5000)
    /// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_SECURITY`: relay (default: smtp.gmail.com:587, starttls)
    /// - `SMTP_VERIFY_CONNECTION`: probe the relay before sending (default: false)
    /// - `EMAILJS_API_URL`, `EMAILJS_PRIVATE_KEY`, `EMAILJS_ACK_TEMPLATE_ID`
    /// - `EMAIL_FROM`, `SENDER_NAME`, `SUBJECT_PREFIX`
    /// - `TRANSPORT_ORDER`: comma list of `smtp`, `email_api` (default: smtp,email_api)
    /// - `SEND_ACKNOWLEDGMENT`, `REQUIRE_ACKNOWLEDGMENT`, `MASK_FAILURES_AS_SUCCESS`
    /// - `TRANSPORT_TIMEOUT_SECS` (default: 15)
    /// - `REQUEST_TIMEOUT_SECS` (default: 4x transport + 10)
    /// - `CONTACT_MIN_{NAME,EMAIL,SUBJECT,MESSAGE}_LEN`
    /// - `LOG_LEVEL`: used when `RUST_LOG` is unset (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // Missing .env is the normal production case
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut missing = Vec::new();

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", get("PORT"), 5000u16, "Must be a port number")?;

        let transport_timeout = Duration::from_secs(parse_or(
            "TRANSPORT_TIMEOUT_SECS",
            get("TRANSPORT_TIMEOUT_SECS"),
            15u64,
            "Must be a positive number of seconds",
        )?);
        if transport_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                var: "TRANSPORT_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than zero".to_string(),
            });
        }

        let request_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(value) => parse_or(
                "REQUEST_TIMEOUT_SECS",
                Some(value),
                0u64,
                "Must be a positive number of seconds",
            )?,
            // Two transports, two sends each, plus headroom for the response
            None => transport_timeout
                .as_secs()
                .checked_mul(4)
                .and_then(|secs| secs.checked_add(10))
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: "TRANSPORT_TIMEOUT_SECS".to_string(),
                    reason: "Too large to derive REQUEST_TIMEOUT_SECS from".to_string(),
                })?,
        };
        let request_timeout = Duration::from_secs(request_secs);

        let smtp = match (get("EMAIL_USER"), get("EMAIL_PASS")) {
            (Some(username), Some(password)) => Some(SmtpConfig {
                host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587u16, "Must be a port number")?,
                username,
                password,
                security: parse_security(get("SMTP_SECURITY"))?,
                verify_connection: parse_bool(
                    "SMTP_VERIFY_CONNECTION",
                    get("SMTP_VERIFY_CONNECTION"),
                    false,
                )?,
                timeout: transport_timeout,
            }),
            (user, pass) => {
                if user.is_none() {
                    missing.push("EMAIL_USER".to_string());
                }
                if pass.is_none() {
                    missing.push("EMAIL_PASS".to_string());
                }
                None
            }
        };

        let api_keys = ["EMAILJS_SERVICE_ID", "EMAILJS_TEMPLATE_ID", "EMAILJS_PUBLIC_KEY"];
        let api_values: Vec<Option<String>> = api_keys.iter().map(|k| get(*k)).collect();
        let email_api = match api_values.as_slice() {
            [Some(service_id), Some(template_id), Some(public_key)] => {
                let endpoint =
                    get("EMAILJS_API_URL").unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string());
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err(ConfigError::InvalidValue {
                        var: "EMAILJS_API_URL".to_string(),
                        reason: "Must start with http:// or https://".to_string(),
                    });
                }
                Some(EmailApiConfig {
                    endpoint,
                    service_id: service_id.clone(),
                    template_id: template_id.clone(),
                    ack_template_id: get("EMAILJS_ACK_TEMPLATE_ID"),
                    public_key: public_key.clone(),
                    private_key: get("EMAILJS_PRIVATE_KEY"),
                    timeout: transport_timeout,
                })
            }
            _ => {
                for (key, value) in api_keys.iter().zip(&api_values) {
                    if value.is_none() {
                        missing.push(key.to_string());
                    }
                }
                None
            }
        };

        let receiver_email = get("RECEIVER_EMAIL");
        if receiver_email.is_none() {
            missing.push("RECEIVER_EMAIL".to_string());
        }

        let sender_email = get("EMAIL_FROM")
            .or_else(|| smtp.as_ref().map(|s| s.username.clone()))
            .or_else(|| receiver_email.clone());

        let transport_order = parse_transport_order(get("TRANSPORT_ORDER"))?;

        let policy = DeliveryPolicy {
            send_acknowledgment: parse_bool(
                "SEND_ACKNOWLEDGMENT",
                get("SEND_ACKNOWLEDGMENT"),
                true,
            )?,
            require_acknowledgment: parse_bool(
                "REQUIRE_ACKNOWLEDGMENT",
                get("REQUIRE_ACKNOWLEDGMENT"),
                false,
            )?,
            mask_failures_as_success: parse_bool(
                "MASK_FAILURES_AS_SUCCESS",
                get("MASK_FAILURES_AS_SUCCESS"),
                false,
            )?,
            transport_timeout,
        };

        let defaults = ValidationRules::default();
        let validation = ValidationRules {
            min_name_len: parse_len(
                "CONTACT_MIN_NAME_LEN",
                get("CONTACT_MIN_NAME_LEN"),
                defaults.min_name_len,
            )?,
            min_email_len: parse_len(
                "CONTACT_MIN_EMAIL_LEN",
                get("CONTACT_MIN_EMAIL_LEN"),
                defaults.min_email_len,
            )?,
            min_subject_len: parse_len(
                "CONTACT_MIN_SUBJECT_LEN",
                get("CONTACT_MIN_SUBJECT_LEN"),
                defaults.min_subject_len,
            )?,
            min_message_len: parse_len(
                "CONTACT_MIN_MESSAGE_LEN",
                get("CONTACT_MIN_MESSAGE_LEN"),
                defaults.min_message_len,
            )?,
            ..defaults
        };

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            host,
            port,
            smtp,
            email_api,
            receiver_email,
            sender_email,
            sender_name: get("SENDER_NAME").unwrap_or_else(|| "Contact Form".to_string()),
            subject_prefix: lookup("SUBJECT_PREFIX").unwrap_or_else(|| "Portfolio".to_string()),
            transport_order,
            policy,
            validation,
            request_timeout,
            log_level,
            missing,
        })
    }

    /// Socket address string to bind the HTTP listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Names of the transports that are configured, in trial order.
    pub fn enabled_transports(&self) -> Vec<TransportKind> {
        self.transport_order
            .iter()
            .copied()
            .filter(|kind| match kind {
                TransportKind::Smtp => self.smtp.is_some(),
                TransportKind::EmailApi => self.email_api.is_some(),
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 5000,
            smtp: None,
            email_api: None,
            receiver_email: None,
            sender_email: None,
            sender_name: "Contact Form".to_string(),
            subject_prefix: "Portfolio".to_string(),
            transport_order: vec![TransportKind::Smtp, TransportKind::EmailApi],
            policy: DeliveryPolicy::default(),
            validation: ValidationRules::default(),
            request_timeout: Duration::from_secs(70),
            log_level: "info".to_string(),
            missing: Vec::new(),
        }
    }
}

/// Parse an optional value with a default, reporting `reason` on failure.
fn parse_or<T: std::str::FromStr>(
    var_name: &str,
    value: Option<String>,
    default: T,
    reason: &str,
) -> ConfigResult<T> {
    match value {
        Some(val) => val.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            var: var_name.to_string(),
            reason: format!("{}, got: {}", reason, val),
        }),
        None => Ok(default),
    }
}

fn parse_len(var_name: &str, value: Option<String>, default: usize) -> ConfigResult<usize> {
    parse_or(var_name, value, default, "Must be a non-negative number")
}

fn parse_bool(var_name: &str, value: Option<String>, default: bool) -> ConfigResult<bool> {
    let Some(val) = value else {
        return Ok(default);
    };
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var: var_name.to_string(),
            reason: format!("Must be true or false, got: {}", val),
        }),
    }
}

fn parse_security(value: Option<String>) -> ConfigResult<SmtpSecurity> {
    let Some(val) = value else {
        return Ok(SmtpSecurity::StartTls);
    };
    match val.trim().to_ascii_lowercase().as_str() {
        "starttls" => Ok(SmtpSecurity::StartTls),
        "tls" | "ssl" | "smtps" => Ok(SmtpSecurity::Tls),
        "none" | "plain" => Ok(SmtpSecurity::None),
        _ => Err(ConfigError::InvalidValue {
            var: "SMTP_SECURITY".to_string(),
            reason: format!("Must be one of starttls, tls, none, got: {}", val),
        }),
    }
}

fn parse_transport_order(value: Option<String>) -> ConfigResult<Vec<TransportKind>> {
    let Some(val) = value else {
        return Ok(vec![TransportKind::Smtp, TransportKind::EmailApi]);
    };

    let mut order = Vec::new();
    for item in val.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = item
            .parse::<TransportKind>()
            .map_err(|reason| ConfigError::InvalidValue {
                var: "TRANSPORT_ORDER".to_string(),
                reason,
            })?;
        if !order.contains(&kind) {
            order.push(kind);
        }
    }

    if order.is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "TRANSPORT_ORDER".to_string(),
            reason: "Must name at least one transport".to_string(),
        });
    }
    Ok(order)
}
