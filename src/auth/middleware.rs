//! Axum middleware for bearer-token authentication.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{field, info_span, warn, Instrument};

use crate::api::error::ApiError;
use crate::auth::jwt::TokenService;
use crate::domain::AccountId;
use crate::errors::{AuthErrorType, ServiceHubError};
use crate::observability::metrics;

pub type TokenServiceState = Arc<dyn TokenService>;

/// Caller identity resolved from a verified auth token.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
    /// Raw token as presented, without the `Bearer ` prefix
    pub token: String,
}

/// Pull the bearer token out of the `Authorization` header.
///
/// Clients send the token either as `Bearer <token>` or bare.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim_start();
    let token = match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &value[7..],
        _ => value,
    }
    .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Middleware entry point that authenticates requests with an auth token.
pub async fn authenticate(
    State(tokens): State<TokenServiceState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "auth_middleware.authenticate",
        http.method = %request.method(),
        http.path = %request.uri().path(),
        account.id = field::Empty,
        correlation_id = %correlation_id
    );

    let Some(token) = bearer_token(request.headers()) else {
        warn!(parent: &span, "missing bearer token");
        metrics::record_authentication("missing_token").await;
        return Err(ServiceHubError::auth("missing bearer token", AuthErrorType::MissingToken)
            .into());
    };

    match tokens.verify_auth_token(&token) {
        Ok(account_id) => {
            span.record("account.id", field::display(account_id));
            request.extensions_mut().insert(AuthenticatedAccount { account_id, token });
            Ok(next.run(request).instrument(span).await)
        }
        Err(err) => {
            warn!(parent: &span, error = %err, "authentication failed");
            let error = ServiceHubError::from(err);
            metrics::record_authentication(error.auth_type().map_or("error", |t| t.as_str()))
                .await;
            Err(error.into())
        }
    }
}
