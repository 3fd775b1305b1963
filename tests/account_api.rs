//! HTTP-level account flows against the real router and an in-memory store.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::TestApp;
use serde_json::json;
use servicehub::domain::AccountId;

const PASSWORD: &str = "correct horse battery staple";

#[tokio::test]
async fn register_returns_created_account_with_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/register",
            None,
            Some(json!({ "email": "alice@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "alice@example.com");
    let id = AccountId::new(body["id"].as_i64().unwrap());
    let token = body["token"].as_str().unwrap();
    assert_eq!(app.tokens.verify_auth_token(token).unwrap(), id);

    assert_eq!(app.activity_tags(token).await, vec!["register"]);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/register",
            None,
            Some(json!({ "email": "alice@example.com", "password": "another" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");
}

#[tokio::test]
async fn surrounding_whitespace_in_email_is_trimmed() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/register",
            None,
            Some(json!({ "email": "  alice@example.com ", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["email"], "alice@example.com");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/account/forgot-password",
            None,
            Some(json!({ "email": " alice@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.mailer.last_token_for("alice@example.com").is_some());

    let (status, _) = app.login(" alice@example.com ", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_registration_input_is_a_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/register",
            None,
            Some(json!({ "email": "not-an-email", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/account/register",
            None,
            Some(json!({ "email": "alice@example.com", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_uses_the_error_envelope() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/account/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send_request(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn login_does_not_reveal_which_part_was_wrong() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let (wrong_password, wrong_body) = app.login("alice@example.com", "nope").await;
    let (unknown_email, unknown_body) = app.login("bob@example.com", PASSWORD).await;

    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "invalid_credentials");
}

#[tokio::test]
async fn login_token_identifies_the_account() {
    let app = TestApp::new().await;
    let register_token = app.register("alice@example.com", PASSWORD).await;
    let account_id = app.tokens.verify_auth_token(&register_token).unwrap();

    let (status, body) = app.login("alice@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert_eq!(app.tokens.verify_auth_token(token).unwrap(), account_id);

    assert_eq!(app.activity_tags(token).await, vec!["login", "register"]);
}

#[tokio::test]
async fn profile_accepts_bare_tokens() {
    let app = TestApp::new().await;
    let token = app.register("alice@example.com", PASSWORD).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/account/profile")
        .header(header::AUTHORIZATION, token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_request(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/v1/account/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");

    let (status, body) =
        app.send(Method::POST, "/api/v1/account/logout", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn logout_records_activity_and_keeps_token_valid() {
    let app = TestApp::new().await;
    let token = app.register("alice@example.com", PASSWORD).await;

    let (status, body) = app.send(Method::POST, "/api/v1/account/logout", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "logout successful");

    // Tokens are not revoked on logout.
    assert_eq!(app.activity_tags(&token).await, vec!["logout", "register"]);
}

#[tokio::test]
async fn password_reset_flow_replaces_the_password() {
    let app = TestApp::new().await;
    app.register("alice@example.com", PASSWORD).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/forgot-password",
            None,
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "password reset email sent");

    let reset_token = app.mailer.last_token_for("alice@example.com").expect("reset mail");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/reset-password",
            None,
            Some(json!({ "token": reset_token, "password": "brand new password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "password reset successful");

    let (old, _) = app.login("alice@example.com", PASSWORD).await;
    assert_eq!(old, StatusCode::UNAUTHORIZED);

    let (new, body) = app.login("alice@example.com", "brand new password").await;
    assert_eq!(new, StatusCode::OK);

    let token = body["token"].as_str().unwrap();
    assert_eq!(
        app.activity_tags(token).await,
        vec!["login", "reset_password", "forgot_password", "register"]
    );
}

#[tokio::test]
async fn forgot_password_for_unknown_email_is_silent() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/forgot-password",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "password reset email sent");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn forgot_password_reports_mail_outage() {
    let app = TestApp::new().await;
    let token = app.register("alice@example.com", PASSWORD).await;
    app.mailer.fail_deliveries();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/forgot-password",
            None,
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "unavailable");
    assert_eq!(app.activity_tags(&token).await, vec!["register"]);
}

#[tokio::test]
async fn tokens_are_bound_to_their_purpose() {
    let app = TestApp::new().await;
    let auth_token = app.register("alice@example.com", PASSWORD).await;
    app.send(
        Method::POST,
        "/api/v1/account/forgot-password",
        None,
        Some(json!({ "email": "alice@example.com" })),
    )
    .await;
    let reset_token = app.mailer.last_token_for("alice@example.com").unwrap();

    let (status, body) =
        app.send(Method::GET, "/api/v1/account/profile", Some(reset_token.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "wrong_token_purpose");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/reset-password",
            None,
            Some(json!({ "token": auth_token, "password": "brand new password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "wrong_token_purpose");
}

#[tokio::test]
async fn change_password_checks_the_current_password() {
    let app = TestApp::new().await;
    let token = app.register("alice@example.com", PASSWORD).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/change-password",
            Some(token.as_str()),
            Some(json!({ "currentPassword": "wrong", "newPassword": "next password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/account/change-password",
            Some(token.as_str()),
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "next password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "password changed successfully");

    assert_eq!(app.login("alice@example.com", PASSWORD).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("alice@example.com", "next password").await.0, StatusCode::OK);
}

#[tokio::test]
async fn update_profile_changes_the_login_email() {
    let app = TestApp::new().await;
    let token = app.register("alice@example.com", PASSWORD).await;
    app.register("bob@example.com", PASSWORD).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/api/v1/account/profile",
            Some(token.as_str()),
            Some(json!({ "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");

    let (status, body) = app
        .send(
            Method::PATCH,
            "/api/v1/account/profile",
            Some(token.as_str()),
            Some(json!({ "email": "alice@new.example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@new.example.com");
    assert_eq!(body["activities"][0]["activity"], "update");

    assert_eq!(app.login("alice@example.com", PASSWORD).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("alice@new.example.com", PASSWORD).await.0, StatusCode::OK);
}

#[tokio::test]
async fn deleted_accounts_disappear() {
    let app = TestApp::new().await;
    let token = app.register("alice@example.com", PASSWORD).await;

    let (status, body) = app.send(Method::DELETE, "/api/v1/account", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = app.send(Method::GET, "/api/v1/account/profile", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    assert_eq!(app.login("alice@example.com", PASSWORD).await.0, StatusCode::UNAUTHORIZED);

    // The address can be registered again.
    app.register("alice@example.com", PASSWORD).await;
}

#[tokio::test]
async fn health_reports_store_status() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/account/register"].is_object());
}
