//! End-to-end tests of the HTTP surface, driven through the router.

mod mocks;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use contact_relay::config::SmtpSecurity;
use contact_relay::{
    router, AppState, DeliveryOrchestrator, DeliveryPolicy, EmailApiClient, EmailApiTransport,
    MessageComposer, Metrics, SmtpConfig, SmtpTransport, Transport, ValidationRules,
};
use mocks::MockTransport;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Rules relaxed so that a two-character subject is accepted.
fn relaxed_rules() -> ValidationRules {
    ValidationRules {
        min_subject_len: 2,
        ..Default::default()
    }
}

fn composer() -> MessageComposer {
    MessageComposer::new("site@example.com", "Contact Form", "owner@example.com", "Portfolio")
}

fn app(transports: Vec<Arc<dyn Transport>>, policy: DeliveryPolicy) -> Router {
    let orchestrator =
        DeliveryOrchestrator::new(transports, Some(composer()), policy, Metrics::new());
    router(
        AppState::new(Arc::new(orchestrator), relaxed_rules()),
        Duration::from_secs(10),
    )
}

fn ana_submission() -> Value {
    json!({
        "name": "Ana",
        "email": "ana@x.com",
        "subject": "Hi",
        "message": "Hello there"
    })
}

async fn post_contact(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(Vec::new(), DeliveryPolicy::default());
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_contact_delivered_over_smtp() {
    let smtp = MockTransport::succeeding("smtp");
    let api = MockTransport::succeeding("email_api");
    let app = app(
        vec![Arc::new(smtp.clone()), Arc::new(api.clone())],
        DeliveryPolicy::default(),
    );

    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Email sent!"}));
    assert_eq!(smtp.sent_count(), 2);
    assert_eq!(api.call_count(), 0);

    let notification = &smtp.sent_messages()[0];
    assert_eq!(notification.subject, "Portfolio: Hi");
    assert_eq!(notification.reply_to, "ana@x.com");
    assert!(notification.html_body.contains("<h2>New Message from Ana</h2>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_contact_falls_back_to_email_api_when_smtp_unreachable() {
    let mut server = mockito::Server::new_async().await;
    let api_mock = server
        .mock("POST", "/api/v1.0/email/send")
        .with_status(200)
        .with_body("OK")
        .expect(2)
        .create_async()
        .await;

    let smtp = SmtpTransport::new(&SmtpConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        username: "user@example.com".to_string(),
        password: "secret".to_string(),
        security: SmtpSecurity::None,
        verify_connection: false,
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    let api = EmailApiTransport::new(EmailApiClient::with_endpoint(
        format!("{}/api/v1.0/email/send", server.url()),
        "service_1",
        "template_1",
        "public_1",
    ));

    let policy = DeliveryPolicy {
        transport_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    let app = app(vec![Arc::new(smtp), Arc::new(api)], policy);

    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email sent!");
    api_mock.assert_async().await;
}

#[tokio::test]
async fn test_contact_without_transports_is_configuration_error() {
    let orchestrator = DeliveryOrchestrator::new(
        Vec::new(),
        Some(composer()),
        DeliveryPolicy::default(),
        Metrics::new(),
    )
    .with_missing(vec!["EMAIL_USER".to_string(), "EMAIL_PASS".to_string()]);
    let app = router(
        AppState::new(Arc::new(orchestrator), relaxed_rules()),
        Duration::from_secs(10),
    );

    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("missing"));
    assert!(error.contains("EMAIL_USER"));
}

#[tokio::test]
async fn test_missing_fields_rejected_without_sending() {
    let smtp = MockTransport::succeeding("smtp");
    let app = app(vec![Arc::new(smtp.clone())], DeliveryPolicy::default());

    let (status, body) = post_contact(app, json!({"name": "A"}).to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert_eq!(smtp.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let smtp = MockTransport::succeeding("smtp");
    let app = app(vec![Arc::new(smtp.clone())], DeliveryPolicy::default());

    let mut submission = ana_submission();
    submission["email"] = json!("not-an-email");
    let (status, body) = post_contact(app, submission.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));
    assert_eq!(smtp.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let smtp = MockTransport::succeeding("smtp");
    let app = app(vec![Arc::new(smtp.clone())], DeliveryPolicy::default());

    let (status, body) = post_contact(app, "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(smtp.call_count(), 0);
}

#[tokio::test]
async fn test_all_transports_failing_returns_500() {
    let smtp = MockTransport::unreachable("smtp");
    let api = MockTransport::unreachable("email_api");
    let app = app(
        vec![Arc::new(smtp.clone()), Arc::new(api.clone())],
        DeliveryPolicy::default(),
    );

    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Connection refused"));
    assert_eq!(smtp.call_count(), 1);
    assert_eq!(api.call_count(), 1);
}

#[tokio::test]
async fn test_masked_failure_reports_success() {
    let smtp = MockTransport::unreachable("smtp");
    let policy = DeliveryPolicy {
        mask_failures_as_success: true,
        ..Default::default()
    };
    let app = app(vec![Arc::new(smtp.clone())], policy);

    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Email sent!"}));
    assert_eq!(smtp.sent_count(), 0);
}

#[tokio::test]
async fn test_partial_delivery_reports_success_with_notice() {
    let smtp = MockTransport::new("smtp", mocks::Behavior::FailAcknowledgments);
    let app = app(vec![Arc::new(smtp.clone())], DeliveryPolicy::default());

    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_ne!(body["message"], "Email sent!");
    assert_eq!(smtp.sent_count(), 1);
}

#[tokio::test]
async fn test_duplicate_submissions_send_twice() {
    let smtp = MockTransport::succeeding("smtp");
    let app = app(vec![Arc::new(smtp.clone())], DeliveryPolicy::default());

    for _ in 0..2 {
        let (status, _) = post_contact(app.clone(), ana_submission().to_string()).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(smtp.sent_count(), 4);
}

fn slow_app(policy: DeliveryPolicy, request_timeout: Duration) -> (Router, MockTransport) {
    let smtp = MockTransport::new("smtp", mocks::Behavior::Hang(Duration::from_secs(5)));
    let orchestrator = DeliveryOrchestrator::new(
        vec![Arc::new(smtp.clone())],
        Some(composer()),
        policy,
        Metrics::new(),
    );
    let app = router(
        AppState::new(Arc::new(orchestrator), relaxed_rules()),
        request_timeout,
    );
    (app, smtp)
}

#[tokio::test]
async fn test_request_timeout_returns_json_failure() {
    let (app, smtp) = slow_app(DeliveryPolicy::default(), Duration::from_millis(100));

    let start = std::time::Instant::now();
    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
    assert_eq!(smtp.sent_count(), 0);
}

#[tokio::test]
async fn test_request_timeout_is_masked_when_configured() {
    let policy = DeliveryPolicy {
        mask_failures_as_success: true,
        ..Default::default()
    };
    let (app, _smtp) = slow_app(policy, Duration::from_millis(100));

    let (status, body) = post_contact(app, ana_submission().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Email sent!"}));
}
