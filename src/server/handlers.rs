//! HTTP handlers for the health and contact routes.
//!
//! Every error is converted to a JSON body of the form
//! `{"success": false, "error": "..."}` at this boundary.

use crate::domain::{ContactRequest, ValidationRules};
use crate::error::{ContactError, ContactResult};
use crate::models::DeliveryOutcome;
use crate::services::DeliveryOrchestrator;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Success message returned for a complete delivery (and for masked failures).
pub const SENT_MESSAGE: &str = "Email sent!";

/// Success message returned when only the notification went out.
pub const PARTIAL_MESSAGE: &str =
    "Message received. A confirmation email could not be sent to your address.";

/// Time budget for delivering one submission unless the router sets another.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(70);

/// Shared state for all handlers. Immutable after start-up.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<DeliveryOrchestrator>,
    validation: ValidationRules,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(orchestrator: Arc<DeliveryOrchestrator>, validation: ValidationRules) -> Self {
        Self {
            orchestrator,
            validation,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound the whole delivery of a submission.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn orchestrator(&self) -> &DeliveryOrchestrator {
        &self.orchestrator
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContactResponse {
    pub fn sent(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let status = match &self {
            ContactError::Validation(_) => StatusCode::BAD_REQUEST,
            ContactError::Configuration(_)
            | ContactError::AllTransportsFailed { .. }
            | ContactError::RequestTimeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ContactResponse::failed(self.to_string()))).into_response()
    }
}

/// `GET /api/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `POST /api/contact`
///
/// The body is read as raw bytes so that malformed JSON and missing fields are
/// both reported through the same 400 response shape. Delivery is bounded by
/// the state's request timeout; an expired request is a delivery failure.
pub async fn contact(
    State(state): State<AppState>,
    body: Bytes,
) -> ContactResult<Json<ContactResponse>> {
    let metrics = state.orchestrator.metrics();

    let request = match ContactRequest::from_json(&body, &state.validation) {
        Ok(request) => request,
        Err(e) => {
            metrics.record_validation_failure();
            warn!(error = %e, "Rejected contact submission");
            return Err(e.into());
        }
    };

    metrics.record_submission();
    info!(
        name = %request.name,
        email_domain = request.email.domain(),
        subject = %request.subject,
        message_len = request.message.chars().count(),
        "Contact form received"
    );

    let delivery = state.orchestrator.deliver(&request);
    let outcome = match tokio::time::timeout(state.request_timeout, delivery).await {
        Ok(outcome) => outcome?,
        Err(_) => {
            metrics.record_delivery_failure();
            error!(
                timeout_ms = state.request_timeout.as_millis() as u64,
                "Delivery exceeded the request time budget"
            );
            return mask_or(&state, ContactError::RequestTimeout(state.request_timeout));
        }
    };

    info!(transport = outcome.transport(), "Contact request finished");

    match outcome {
        DeliveryOutcome::Sent { partial: false, .. } => {
            Ok(Json(ContactResponse::sent(SENT_MESSAGE)))
        }
        DeliveryOutcome::Sent { partial: true, .. } => {
            Ok(Json(ContactResponse::sent(PARTIAL_MESSAGE)))
        }
        DeliveryOutcome::Failed { transport, cause } => {
            mask_or(&state, ContactError::AllTransportsFailed { transport, cause })
        }
    }
}

/// Answer a delivery failure, or report success when failures are masked.
fn mask_or(state: &AppState, err: ContactError) -> ContactResult<Json<ContactResponse>> {
    if state.orchestrator.policy().mask_failures_as_success {
        warn!(error = %err, "Delivery failed, reporting success to caller");
        Ok(Json(ContactResponse::sent(SENT_MESSAGE)))
    } else {
        Err(err)
    }
}
