//! Health check endpoint for monitoring and readiness probes

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::api::routes::ApiState;
use crate::storage::check_connection;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the account store is reachable, `degraded` otherwise
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Health check endpoint
///
/// Returns 200 when the account store answers a ping and 503 when it does not.
/// Unauthenticated; suitable for liveness/readiness probes.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Account store unreachable", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    match check_connection(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::new("ok", "ok"))),
        Err(e) => {
            warn!(error = %e, "health check failed to reach account store");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::new("degraded", "unavailable")))
        }
    }
}

impl HealthResponse {
    fn new(status: &str, database: &str) -> Self {
        Self {
            status: status.to_string(),
            database: database.to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}
