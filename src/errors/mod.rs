//! # Error Handling
//!
//! Error types for the ServiceHub account service, built on `thiserror`.
//! Component-level errors (hashing, tokens, mail) convert into [`ServiceHubError`]
//! so the account workflow can propagate them with `?`.

use std::fmt;

use crate::auth::hashing::HashError;
use crate::auth::jwt::TokenError;
use crate::mail::MailError;

/// Custom result type for ServiceHub operations
pub type Result<T> = std::result::Result<T, ServiceHubError>;

/// Short alias used throughout the crate
pub type Error = ServiceHubError;

/// Main error type for the ServiceHub account service
#[derive(thiserror::Error, Debug)]
pub enum ServiceHubError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors (malformed input)
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Authentication errors
    #[error("Authentication error: {message}")]
    Auth { message: String, error_type: AuthErrorType },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound { resource_type: String, id: String },

    /// Resource conflict errors (e.g., email already registered)
    #[error("Resource conflict: {message}")]
    Conflict { message: String, resource_type: String },

    /// An external collaborator (mail relay, store) could not serve the request
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Authentication error subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorType {
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,
    WrongPurpose,
    MissingToken,
}

impl AuthErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorType::InvalidCredentials => "invalid_credentials",
            AuthErrorType::InvalidToken => "invalid_token",
            AuthErrorType::ExpiredToken => "expired_token",
            AuthErrorType::WrongPurpose => "wrong_token_purpose",
            AuthErrorType::MissingToken => "missing_token",
        }
    }
}

impl fmt::Display for AuthErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceHubError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S, error_type: AuthErrorType) -> Self {
        Self::Auth { message: message.into(), error_type }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a conflict error
    pub fn conflict<M: Into<String>, R: Into<String>>(message: M, resource_type: R) -> Self {
        Self::Conflict { message: message.into(), resource_type: resource_type.into() }
    }

    /// Create an unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable { message: message.into() }
    }

    /// Wrap a sqlx error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Returns the authentication subtype when this is an auth error
    pub fn auth_type(&self) -> Option<AuthErrorType> {
        match self {
            ServiceHubError::Auth { error_type, .. } => Some(*error_type),
            _ => None,
        }
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceHubError::Config { .. } => 500,
            ServiceHubError::Database { .. } => 503,
            ServiceHubError::Io { .. } => 500,
            ServiceHubError::Serialization { .. } => 400,
            ServiceHubError::Validation { .. } => 400,
            ServiceHubError::Auth { .. } => 401,
            ServiceHubError::NotFound { .. } => 404,
            ServiceHubError::Conflict { .. } => 409,
            ServiceHubError::Unavailable { .. } => 503,
            ServiceHubError::Internal { .. } => 500,
        }
    }
}

impl From<sqlx::Error> for ServiceHubError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<sqlx::migrate::MigrateError> for ServiceHubError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::Database {
            source: sqlx::Error::Migrate(Box::new(error)),
            context: "Database migration failed".to_string(),
        }
    }
}

impl From<std::io::Error> for ServiceHubError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for ServiceHubError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for ServiceHubError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

impl From<HashError> for ServiceHubError {
    fn from(error: HashError) -> Self {
        match error {
            HashError::EmptyInput => Self::validation_field("password cannot be empty", "password"),
            HashError::MalformedHash(_) | HashError::Hashing(_) => {
                Self::Internal { message: error.to_string(), source: Some(Box::new(error)) }
            }
        }
    }
}

impl From<TokenError> for ServiceHubError {
    fn from(error: TokenError) -> Self {
        let error_type = match error {
            TokenError::SigningKeyMissing => return Self::config(error.to_string()),
            TokenError::Invalid(_) => AuthErrorType::InvalidToken,
            TokenError::Expired => AuthErrorType::ExpiredToken,
            TokenError::WrongPurpose { .. } => AuthErrorType::WrongPurpose,
        };
        Self::auth(error.to_string(), error_type)
    }
}

impl From<MailError> for ServiceHubError {
    fn from(error: MailError) -> Self {
        match error {
            MailError::ServerUrlNotSet => Self::config(error.to_string()),
            MailError::DeliveryFailed(_) => Self::unavailable(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = ServiceHubError::config("Test configuration error");
        assert!(matches!(error, ServiceHubError::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: Test configuration error");
    }

    #[test]
    fn test_validation_error() {
        let error = ServiceHubError::validation_field("Invalid email format", "email");
        if let ServiceHubError::Validation { field, .. } = error {
            assert_eq!(field, Some("email".to_string()));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceHubError::validation("test").status_code(), 400);
        assert_eq!(
            ServiceHubError::auth("test", AuthErrorType::InvalidCredentials).status_code(),
            401
        );
        assert_eq!(ServiceHubError::not_found("account", "1").status_code(), 404);
        assert_eq!(ServiceHubError::conflict("test", "account").status_code(), 409);
        assert_eq!(ServiceHubError::unavailable("mail").status_code(), 503);
        assert_eq!(ServiceHubError::internal("test").status_code(), 500);
    }

    #[test]
    fn token_errors_map_to_auth_subtypes() {
        let expired: ServiceHubError = TokenError::Expired.into();
        assert_eq!(expired.auth_type(), Some(AuthErrorType::ExpiredToken));

        let invalid: ServiceHubError = TokenError::Invalid("bad".into()).into();
        assert_eq!(invalid.auth_type(), Some(AuthErrorType::InvalidToken));

        let missing: ServiceHubError = TokenError::SigningKeyMissing.into();
        assert!(matches!(missing, ServiceHubError::Config { .. }));
    }

    #[test]
    fn empty_password_maps_to_validation() {
        let error: ServiceHubError = HashError::EmptyInput.into();
        assert_eq!(error.status_code(), 400);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ServiceHubError = io_error.into();
        assert!(matches!(error, ServiceHubError::Io { .. }));

        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: ServiceHubError = json_error.into();
        assert!(matches!(error, ServiceHubError::Serialization { .. }));
    }
}
