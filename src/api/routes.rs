use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::warn;

use crate::auth::{middleware::authenticate, TokenService};
use crate::config::ServerConfig;
use crate::observability::trace_http_requests;
use crate::services::AccountService;
use crate::storage::DbPool;

use super::{
    docs,
    handlers::{
        change_password_handler, delete_account_handler, forgot_password_handler,
        get_profile_handler, health_handler, login_handler, logout_handler, register_handler,
        reset_password_handler, update_profile_handler,
    },
};

#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<dyn TokenService>,
    pub pool: DbPool,
}

pub fn build_router(state: ApiState, config: &ServerConfig) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.tokens.clone(), authenticate);

    let public_api = Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/account/register", post(register_handler))
        .route("/api/v1/account/login", post(login_handler))
        .route("/api/v1/account/forgot-password", post(forgot_password_handler))
        .route("/api/v1/account/reset-password", post(reset_password_handler));

    let secured_api = Router::new()
        .route("/api/v1/account/logout", post(logout_handler))
        .route("/api/v1/account/profile", get(get_profile_handler).patch(update_profile_handler))
        .route("/api/v1/account", delete(delete_account_handler))
        .route("/api/v1/account/change-password", post(change_password_handler))
        .route_layer(auth_layer);

    let router = public_api
        .merge(secured_api)
        .with_state(state)
        .merge(docs::docs_router())
        .layer(TimeoutLayer::new(config.timeout()))
        .layer(middleware::from_fn(trace_http_requests));

    if config.enable_cors {
        router.layer(cors_layer(&config.cors_origins))
    } else {
        router
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
