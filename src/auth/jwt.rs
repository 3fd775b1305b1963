//! Stateless HS256 tokens for authentication and password reset.
//!
//! Both token kinds carry `sub`, `iat`, `exp` and a `purpose` claim. The
//! purpose is checked on every verification, so a reset token can never be
//! used as a session and vice versa.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::TokenConfig;
use crate::domain::AccountId;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Auth,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Auth => "auth",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }

    fn other(self) -> Self {
        match self {
            TokenPurpose::Auth => TokenPurpose::PasswordReset,
            TokenPurpose::PasswordReset => TokenPurpose::Auth,
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub purpose: TokenPurpose,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing key is not configured")]
    SigningKeyMissing,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token has expired")]
    Expired,
    #[error("token purpose mismatch: expected {expected}, found {found}")]
    WrongPurpose { expected: TokenPurpose, found: TokenPurpose },
}

/// Issuance and verification of purpose-scoped bearer tokens.
pub trait TokenService: Send + Sync {
    fn issue_auth_token(&self, account_id: AccountId) -> Result<String, TokenError>;

    fn verify_auth_token(&self, token: &str) -> Result<AccountId, TokenError>;

    fn issue_password_reset_token(&self, account_id: AccountId) -> Result<String, TokenError>;

    fn verify_password_reset_token(&self, token: &str) -> Result<AccountId, TokenError>;
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// [`TokenService`] backed by `jsonwebtoken` with HMAC-SHA256 signatures.
pub struct JwtTokenService {
    auth_key: Option<SigningKey>,
    reset_key: Option<SigningKey>,
    distinct_reset_secret: bool,
    auth_ttl_seconds: i64,
    reset_ttl_seconds: i64,
    leeway_seconds: i64,
    validation: Validation,
}

impl JwtTokenService {
    pub fn new(config: TokenConfig) -> Self {
        let auth_key = config.jwt_secret.as_deref().map(SigningKey::from_secret);
        let reset_secret = config.reset_secret.as_deref().or(config.jwt_secret.as_deref());
        let reset_key = reset_secret.map(SigningKey::from_secret);
        let distinct_reset_secret =
            matches!((&config.reset_secret, &config.jwt_secret), (Some(r), Some(a)) if r != a);

        // Expiry is checked by hand against the verification instant.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            auth_key,
            reset_key,
            distinct_reset_secret,
            auth_ttl_seconds: config.auth_token_ttl_seconds,
            reset_ttl_seconds: config.reset_token_ttl_seconds,
            leeway_seconds: i64::try_from(config.leeway_seconds).unwrap_or(i64::MAX),
            validation,
        }
    }

    fn key(&self, purpose: TokenPurpose) -> Option<&SigningKey> {
        match purpose {
            TokenPurpose::Auth => self.auth_key.as_ref(),
            TokenPurpose::PasswordReset => self.reset_key.as_ref(),
        }
    }

    fn ttl(&self, purpose: TokenPurpose) -> i64 {
        match purpose {
            TokenPurpose::Auth => self.auth_ttl_seconds,
            TokenPurpose::PasswordReset => self.reset_ttl_seconds,
        }
    }

    pub(crate) fn issue_at(
        &self,
        account_id: AccountId,
        purpose: TokenPurpose,
        now: i64,
    ) -> Result<String, TokenError> {
        let key = self.key(purpose).ok_or(TokenError::SigningKeyMissing)?;
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl(purpose)),
            purpose,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &key.encoding)
            .map_err(|e| TokenError::Invalid(format!("failed to sign token: {e}")))
    }

    pub(crate) fn verify_at(
        &self,
        token: &str,
        expected: TokenPurpose,
        now: i64,
    ) -> Result<AccountId, TokenError> {
        let key = self.key(expected).ok_or(TokenError::SigningKeyMissing)?;

        let claims = match decode::<Claims>(token, &key.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(err) if matches!(err.kind(), ErrorKind::InvalidSignature) => {
                return Err(self.classify_foreign_signature(token, expected, err.to_string()));
            }
            Err(err) => return Err(TokenError::Invalid(err.to_string())),
        };

        if claims.purpose != expected {
            return Err(TokenError::WrongPurpose { expected, found: claims.purpose });
        }

        if now > claims.exp.saturating_add(self.leeway_seconds) {
            return Err(TokenError::Expired);
        }

        claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| TokenError::Invalid("subject is not an account id".to_string()))
    }

    /// A signature mismatch may mean the token was signed for the other purpose
    /// under a distinct secret.
    fn classify_foreign_signature(
        &self,
        token: &str,
        expected: TokenPurpose,
        reason: String,
    ) -> TokenError {
        if !self.distinct_reset_secret {
            return TokenError::Invalid(reason);
        }

        let other = expected.other();
        match self.key(other).map(|key| decode::<Claims>(token, &key.decoding, &self.validation)) {
            Some(Ok(data)) if data.claims.purpose == other => {
                TokenError::WrongPurpose { expected, found: other }
            }
            _ => TokenError::Invalid(reason),
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue_auth_token(&self, account_id: AccountId) -> Result<String, TokenError> {
        self.issue_at(account_id, TokenPurpose::Auth, Utc::now().timestamp())
    }

    fn verify_auth_token(&self, token: &str) -> Result<AccountId, TokenError> {
        self.verify_at(token, TokenPurpose::Auth, Utc::now().timestamp())
    }

    fn issue_password_reset_token(&self, account_id: AccountId) -> Result<String, TokenError> {
        self.issue_at(account_id, TokenPurpose::PasswordReset, Utc::now().timestamp())
    }

    fn verify_password_reset_token(&self, token: &str) -> Result<AccountId, TokenError> {
        self.verify_at(token, TokenPurpose::PasswordReset, Utc::now().timestamp())
    }
}
