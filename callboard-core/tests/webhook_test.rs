mod common;

use std::time::Duration;

use wiremock::matchers::{any, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use callboard_core::{
    CallboardError, PhoneNumber, ProbeStatus, Scope, WebhookKind, WebhooksConfig,
};

use common::{Harness, MockGateway};

fn harness_for(url: &str, probe_timeout_secs: u64) -> Harness {
    Harness::with_webhooks(
        vec![
            MockGateway::new("a").with_numbers(vec![PhoneNumber::new("PN1", "+15551111111")]),
            MockGateway::new("b").with_numbers(vec![
                PhoneNumber::new("PN2", "+15552222222").with_voice_url(url),
                PhoneNumber::new("PN3", "+15553333333")
                    .with_sms_url(&format!("{}/sms", url.trim_end_matches("/voice"))),
            ]),
        ],
        &[],
        WebhooksConfig {
            probe_timeout_secs,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_unconfigured_url_is_never_probed() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let configured = format!("{}/voice", server.uri());
    let harness = harness_for(&configured, 5);

    let err = harness
        .board
        .webhooks
        .test(&Scope::All, &format!("{}/other", server.uri()), WebhookKind::Voice)
        .await
        .unwrap_err();

    assert!(matches!(err, CallboardError::WebhookNotConfigured(_)));
    assert_eq!(err.error_code(), "E4001");
}

#[tokio::test]
async fn test_url_configured_in_other_account_is_rejected_for_single_scope() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let configured = format!("{}/voice", server.uri());
    let harness = harness_for(&configured, 5);

    let result = harness
        .board
        .webhooks
        .test(&Scope::single("a"), &configured, WebhookKind::Voice)
        .await;

    assert!(matches!(result, Err(CallboardError::WebhookNotConfigured(_))));
}

#[tokio::test]
async fn test_empty_url_is_a_validation_error() {
    let harness = harness_for("https://hooks.example.com/voice", 5);

    let err = harness
        .board
        .webhooks
        .test(&Scope::All, "  ", WebhookKind::Sms)
        .await
        .unwrap_err();

    assert!(matches!(err, CallboardError::ValidationError(_)));
}

#[tokio::test]
async fn test_healthy_voice_probe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/voice"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("user-agent", "TwilioProxy/1.1"))
        .and(header("x-twilio-signature", "test-signature"))
        .and(body_string_contains("CallStatus=ringing"))
        .and(body_string_contains("AccountSid=ACTEST000000000000000000000000000"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let configured = format!("{}/voice", server.uri());
    let harness = harness_for(&configured, 5);

    let result = harness
        .board
        .webhooks
        .test(&Scope::All, &configured, WebhookKind::Voice)
        .await
        .unwrap();

    assert_eq!(result.status, ProbeStatus::Healthy);
    assert_eq!(result.http_status, Some(200));
    assert_eq!(result.error, None);
}

#[tokio::test]
async fn test_sms_probe_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sms"))
        .and(body_string_contains("SmsStatus=received"))
        .and(body_string_contains("NumMedia=0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let harness = harness_for(&format!("{}/voice", server.uri()), 5);

    let result = harness
        .board
        .webhooks
        .test(&Scope::All, &format!("{}/sms", server.uri()), WebhookKind::Sms)
        .await
        .unwrap();

    assert!(result.is_healthy());
    assert_eq!(result.http_status, Some(204));
}

#[tokio::test]
async fn test_server_error_is_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let configured = format!("{}/voice", server.uri());
    let harness = harness_for(&configured, 5);

    let result = harness
        .board
        .webhooks
        .test(&Scope::All, &configured, WebhookKind::Voice)
        .await
        .unwrap();

    assert_eq!(result.status, ProbeStatus::Unhealthy);
    assert_eq!(result.http_status, Some(500));
    assert_eq!(result.error.as_deref(), Some("HTTP 500"));
}

#[tokio::test]
async fn test_redirect_is_classified_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/voice"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "http://169.254.169.254/latest"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let configured = format!("{}/voice", server.uri());
    let harness = harness_for(&configured, 5);

    let result = harness
        .board
        .webhooks
        .test(&Scope::All, &configured, WebhookKind::Voice)
        .await
        .unwrap();

    assert_eq!(result.status, ProbeStatus::Healthy);
    assert_eq!(result.http_status, Some(302));
}

#[tokio::test]
async fn test_slow_endpoint_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let configured = format!("{}/voice", server.uri());
    let harness = harness_for(&configured, 1);

    let result = harness
        .board
        .webhooks
        .test(&Scope::All, &configured, WebhookKind::Voice)
        .await
        .unwrap();

    assert_eq!(result.status, ProbeStatus::Unreachable);
    assert_eq!(result.http_status, None);
    assert_eq!(result.error.as_deref(), Some("Connection timeout"));
    assert!(result.response_time_ms >= 900);
}

#[tokio::test]
async fn test_refused_connection_is_unreachable() {
    // Bind then drop a server so the port is closed.
    let configured = {
        let server = MockServer::start().await;
        format!("{}/voice", server.uri())
    };
    let harness = harness_for(&configured, 2);

    let result = harness
        .board
        .webhooks
        .test(&Scope::All, &configured, WebhookKind::Voice)
        .await
        .unwrap();

    assert_eq!(result.status, ProbeStatus::Unreachable);
    assert!(result.error.is_some());
    assert_ne!(result.error.as_deref(), Some("Connection timeout"));
}
