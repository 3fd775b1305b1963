//! Common test utilities for all integration tests.
//!
//! [`TestApp`] wires the real router, store, hasher and token service over an
//! in-memory database. Mail is captured instead of sent.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod test_db;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use servicehub::api::{build_router, ApiState};
use servicehub::auth::{Argon2Hasher, JwtTokenService, TokenService};
use servicehub::config::{DatabaseConfig, HashingConfig, ServerConfig, TokenConfig};
use servicehub::mail::{MailError, MailSender};
use servicehub::services::AccountService;
use servicehub::storage::{create_pool, DbPool, SqlxAccountRepository};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Argon2 parameters cheap enough for tests
pub fn fast_hashing() -> HashingConfig {
    HashingConfig { memory_cost_kib: 256, iterations: 1, parallelism: 1 }
}

pub fn token_config() -> TokenConfig {
    TokenConfig { jwt_secret: Some(TEST_SECRET.to_string()), ..Default::default() }
}

pub async fn memory_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        auto_migrate: true,
        ..Default::default()
    };
    create_pool(&config).await.expect("create in-memory pool")
}

/// Records reset mails so tests can follow the link's token.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl CapturingMailer {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent().into_iter().rev().find(|(to, _)| to == email).map(|(_, token)| token)
    }

    pub fn fail_deliveries(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl MailSender for CapturingMailer {
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), MailError> {
        if *self.fail.lock().unwrap() {
            return Err(MailError::DeliveryFailed("relay returned 502".to_string()));
        }
        self.sent.lock().unwrap().push((email.to_string(), token.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub mailer: Arc<CapturingMailer>,
    pub tokens: Arc<dyn TokenService>,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = memory_pool().await;
        let mailer = Arc::new(CapturingMailer::default());
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(token_config()));
        let hasher = Arc::new(Argon2Hasher::new(&fast_hashing()).expect("hasher"));
        let accounts = Arc::new(SqlxAccountRepository::new(pool.clone()));

        let service = AccountService::new(accounts, hasher, tokens.clone(), mailer.clone());
        let state =
            ApiState { accounts: Arc::new(service), tokens: tokens.clone(), pool: pool.clone() };
        let router = build_router(state, &ServerConfig::default());

        Self { router, pool, mailer, tokens }
    }

    /// Send a request and decode the JSON response body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json =
            if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    /// Register an account and return its auth token.
    pub async fn register(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/account/register",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/account/login",
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn activity_tags(&self, token: &str) -> Vec<String> {
        let (status, body) = self.send(Method::GET, "/api/v1/account/profile", Some(token), None).await;
        assert_eq!(status, StatusCode::OK, "profile failed: {body}");
        body["activities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["activity"].as_str().unwrap().to_string())
            .collect()
    }
}
