use axum::{
    extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::errors::{AuthErrorType, Error};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    Unauthorized(AuthErrorType, String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable, machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_input",
            ApiError::Conflict(_) => "already_exists",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(error_type, _) => error_type.as_str(),
            ApiError::ServiceUnavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Stable error kind, e.g. `invalid_credentials` or `already_exists`
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error = self.kind().to_string();

        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(_, msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => msg,
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { message, .. } => ApiError::BadRequest(message),
            Error::Serialization { context, .. } => ApiError::BadRequest(context),
            Error::Conflict { message, .. } => ApiError::Conflict(message),
            Error::NotFound { resource_type, .. } => {
                ApiError::NotFound(format!("{} not found", resource_type))
            }
            Error::Auth { message, error_type } => ApiError::Unauthorized(error_type, message),
            Error::Unavailable { message } => ApiError::ServiceUnavailable(message),
            Error::Database { ref source, ref context } => {
                error!(error = %source, context = %context, "store operation failed");
                ApiError::ServiceUnavailable("account store unavailable".to_string())
            }
            Error::Config { .. } | Error::Io { .. } | Error::Internal { .. } => {
                error!(error = %err, "request failed with internal error");
                ApiError::Internal("internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::from(errors).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_keep_their_kind() {
        let api: ApiError = Error::auth("bad", AuthErrorType::ExpiredToken).into();
        assert_eq!(api.kind(), "expired_token");
        assert_eq!(api.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn conflicts_report_already_exists() {
        let api: ApiError = Error::conflict("taken", "account").into();
        assert_eq!(api.kind(), "already_exists");
        assert_eq!(api.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let api: ApiError = Error::config("JWT secret missing").into();
        match api {
            ApiError::Internal(ref message) => assert_eq!(message, "internal server error"),
            ref other => panic!("unexpected {:?}", other),
        }
        assert_eq!(api.kind(), "internal");
    }

    #[test]
    fn store_failures_are_unavailable() {
        let api: ApiError = Error::database(sqlx::Error::PoolTimedOut, "lookup").into();
        assert_eq!(api.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
