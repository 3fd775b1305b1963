//! # Observability Infrastructure
//!
//! Structured logging, OpenTelemetry tracing and Prometheus metrics for the
//! ServiceHub account service.

pub mod http_tracing;
pub mod logging;
pub mod metrics;
pub mod tracing;

pub use http_tracing::trace_http_requests;
pub use logging::log_config_info;
pub use metrics::{init_metrics, MetricsRecorder};
pub use tracing::{init_tracing_with_logging, shutdown_tracing};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialize all observability components
///
/// The returned provider must be passed to [`shutdown_tracing`] before exit so
/// buffered spans are flushed.
pub async fn init_observability(
    config: &ObservabilityConfig,
) -> Result<Option<opentelemetry_sdk::trace::SdkTracerProvider>> {
    let provider = init_tracing_with_logging(config).await?;

    if let (Some(endpoint), true) = (&config.otlp_endpoint, provider.is_some()) {
        info!(otlp_endpoint = %endpoint, "OpenTelemetry tracing initialized");
    }

    if config.enable_metrics {
        init_metrics(config).await?;
    }

    info!(
        service_name = %config.service_name,
        environment = %config.environment,
        log_level = %config.log_level,
        metrics_enabled = %config.enable_metrics,
        tracing_enabled = %config.enable_tracing,
        "Observability initialized successfully"
    );

    Ok(provider)
}
