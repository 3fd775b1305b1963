//! HTTP mail relay delivery against a mock relay.

use hmac::{Hmac, Mac};
use serde_json::Value;
use servicehub::config::MailConfig;
use servicehub::mail::{build_mail_sender, HttpMailSender, MailError, MailSender, SIGNATURE_HEADER};
use sha2::Sha256;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RELAY_SECRET: &str = "relay-shared-secret";

fn relay_config(server: &MockServer, secret: Option<&str>) -> MailConfig {
    MailConfig {
        server_url: Some("https://hub.example.com".to_string()),
        relay_url: Some(format!("{}/send", server.uri())),
        relay_secret: secret.map(str::to_string),
        from_address: "no-reply@hub.example.com".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn relay_receives_signed_reset_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("content-type", "application/json"))
        .and(header_exists(SIGNATURE_HEADER))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let sender = HttpMailSender::new(&relay_config(&server, Some(RELAY_SECRET))).unwrap();
    sender.send_password_reset_email("alice@example.com", "reset.token.value").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];

    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["to"], "alice@example.com");
    assert_eq!(body["from"], "no-reply@hub.example.com");
    assert_eq!(body["reset_url"], "https://hub.example.com/reset-password?token=reset.token.value");
    assert!(body["text"].as_str().unwrap().contains("reset-password?token=reset.token.value"));

    let mut mac = Hmac::<Sha256>::new_from_slice(RELAY_SECRET.as_bytes()).unwrap();
    mac.update(&request.body);
    let expected = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
    let signature = request.headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
    assert_eq!(signature, expected);
}

#[tokio::test]
async fn unsigned_when_no_secret_is_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sender = build_mail_sender(&relay_config(&server, None)).unwrap();
    sender.send_password_reset_email("alice@example.com", "t").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get(SIGNATURE_HEADER).is_none());
}

#[tokio::test]
async fn relay_errors_are_delivery_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let sender = HttpMailSender::new(&relay_config(&server, Some(RELAY_SECRET))).unwrap();
    let err = sender.send_password_reset_email("alice@example.com", "t").await.unwrap_err();

    assert!(matches!(err, MailError::DeliveryFailed(_)));
}

#[tokio::test]
async fn missing_server_url_is_reported_before_contacting_the_relay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = MailConfig { server_url: None, ..relay_config(&server, None) };
    let sender = HttpMailSender::new(&config).unwrap();
    let err = sender.send_password_reset_email("alice@example.com", "t").await.unwrap_err();

    assert!(matches!(err, MailError::ServerUrlNotSet));
}
