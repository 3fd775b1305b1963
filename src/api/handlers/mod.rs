//! HTTP handlers for the account API.

pub mod account;
pub mod health;

pub use account::{
    change_password_handler, delete_account_handler, forgot_password_handler,
    get_profile_handler, login_handler, logout_handler, register_handler,
    reset_password_handler, update_profile_handler, ChangePasswordRequest,
    ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest,
    TokenResponse, UpdateProfileRequest,
};
pub use health::{health_handler, HealthResponse};
