use axum::Router;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::account::register_handler,
        crate::api::handlers::account::login_handler,
        crate::api::handlers::account::logout_handler,
        crate::api::handlers::account::get_profile_handler,
        crate::api::handlers::account::update_profile_handler,
        crate::api::handlers::account::delete_account_handler,
        crate::api::handlers::account::change_password_handler,
        crate::api::handlers::account::forgot_password_handler,
        crate::api::handlers::account::reset_password_handler
    ),
    components(
        schemas(
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::account::RegisterRequest,
            crate::api::handlers::account::LoginRequest,
            crate::api::handlers::account::ForgotPasswordRequest,
            crate::api::handlers::account::ResetPasswordRequest,
            crate::api::handlers::account::ChangePasswordRequest,
            crate::api::handlers::account::UpdateProfileRequest,
            crate::api::handlers::account::TokenResponse,
            crate::api::handlers::account::MessageResponse,
            crate::api::error::ErrorBody,
            crate::services::RegisteredAccount,
            crate::domain::AccountProfile,
            crate::domain::AccountActivity,
            crate::domain::ActivityKind,
            crate::domain::AccountId
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "account", description = "Account registration, login and password management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

pub fn docs_router() -> Router {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()).into()
}
