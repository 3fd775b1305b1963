//! Account endpoints: registration, login, profile and password management.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::error::{ApiError, ErrorBody};
use crate::api::routes::ApiState;
use crate::auth::AuthenticatedAccount;
use crate::domain::AccountProfile;
use crate::services::RegisteredAccount;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "email is required"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, message = "email is required"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    /// Token from the password reset link
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[validate(length(min = 1, message = "new password is required"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "email is required"))]
    #[schema(example = "new@example.com")]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self { message: message.to_string() })
    }
}

/// Unwrap a JSON body and run its field validation.
fn validated<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let Json(body) = payload?;
    body.validate()?;
    Ok(body)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisteredAccount),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 503, description = "Account store unavailable", body = ErrorBody)
    ),
    tag = "account"
)]
pub async fn register_handler(
    State(state): State<ApiState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredAccount>), ApiError> {
    let body = validated(payload)?;
    let registered = state.accounts.register(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    ),
    tag = "account"
)]
pub async fn login_handler(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let body = validated(payload)?;
    let token = state.accounts.login(&body.email, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/logout",
    responses(
        (status = 200, description = "Logout recorded", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "account"
)]
pub async fn logout_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<AuthenticatedAccount>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.accounts.logout(&caller.token).await?;
    Ok(MessageResponse::new("logout successful"))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/profile",
    responses(
        (status = 200, description = "Account profile", body = AccountProfile),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "account"
)]
pub async fn get_profile_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<AuthenticatedAccount>,
) -> Result<Json<AccountProfile>, ApiError> {
    let profile = state.accounts.profile(&caller.token).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    patch,
    path = "/api/v1/account/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AccountProfile),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "account"
)]
pub async fn update_profile_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<AccountProfile>, ApiError> {
    let body = validated(payload)?;
    let profile = state.accounts.update_email(&caller.token, &body.email).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "account"
)]
pub async fn delete_account_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<AuthenticatedAccount>,
) -> Result<StatusCode, ApiError> {
    state.accounts.delete_account(&caller.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Wrong current password or invalid token", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "account"
)]
pub async fn change_password_handler(
    State(state): State<ApiState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let body = validated(payload)?;
    state
        .accounts
        .change_password(&caller.token, &body.current_password, &body.new_password)
        .await?;
    Ok(MessageResponse::new("password changed successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 503, description = "Mail delivery unavailable", body = ErrorBody)
    ),
    tag = "account"
)]
pub async fn forgot_password_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let body = validated(payload)?;
    state.accounts.forgot_password(&body.email).await?;
    Ok(MessageResponse::new("password reset email sent"))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid, expired or wrong-purpose token", body = ErrorBody)
    ),
    tag = "account"
)]
pub async fn reset_password_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let body = validated(payload)?;
    state.accounts.reset_password(&body.token, &body.password).await?;
    Ok(MessageResponse::new("password reset successful"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_leaves_email_format_to_the_service() {
        let padded =
            RegisterRequest { email: " a@x.com ".to_string(), password: "pw".to_string() };
        assert!(padded.validate().is_ok());

        let empty = RegisterRequest { email: String::new(), password: "pw".to_string() };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn change_password_request_uses_camel_case() {
        let request: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword":"old","newPassword":"new"}"#).unwrap();
        assert_eq!(request.current_password, "old");
        assert_eq!(request.new_password, "new");
    }

    #[test]
    fn empty_reset_token_is_invalid() {
        let request = ResetPasswordRequest { token: String::new(), password: "pw".to_string() };
        assert!(request.validate().is_err());
    }
}
