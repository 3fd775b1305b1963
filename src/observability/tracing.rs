//! # Distributed Tracing
//!
//! Sets up the global `tracing` subscriber and, when an OTLP endpoint is
//! configured, bridges `#[instrument]` spans to OpenTelemetry through
//! `tracing-opentelemetry`.

use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider, Resource};
use tracing_subscriber::{
    filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::ObservabilityConfig;
use crate::errors::{Result, ServiceHubError};

/// Build the log filter from `RUST_LOG`, falling back to the configured level.
fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            ServiceHubError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?;

    ["hyper=warn", "opentelemetry_sdk=warn"].into_iter().try_fold(filter, |filter, directive| {
        let directive = directive
            .parse::<Directive>()
            .map_err(|e| ServiceHubError::config(format!("Invalid log directive: {e}")))?;
        Ok(filter.add_directive(directive))
    })
}

fn resource(config: &ObservabilityConfig) -> Resource {
    Resource::builder_empty()
        .with_attributes(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", crate::VERSION),
            KeyValue::new("service.namespace", config.service_namespace.clone()),
            KeyValue::new("deployment.environment", config.environment.clone()),
        ])
        .build()
}

/// Create an OTLP tracer provider exporting over gRPC.
fn init_tracer_provider(config: &ObservabilityConfig, endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| {
            ServiceHubError::config(format!("Failed to build OTLP exporter for {endpoint}: {e}"))
        })?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource(config))
        .build();

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TraceContextPropagator::new());
    Ok(provider)
}

/// Initialize logging and, when enabled, OpenTelemetry span export.
///
/// Returns the tracer provider so it can be flushed on shutdown.
pub async fn init_tracing_with_logging(
    config: &ObservabilityConfig,
) -> Result<Option<SdkTracerProvider>> {
    let filter = env_filter(config)?;

    let provider = match (&config.otlp_endpoint, config.enable_tracing) {
        (Some(endpoint), true) => Some(init_tracer_provider(config, endpoint)?),
        _ => None,
    };

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(crate::APP_NAME))
    });
    let json_layer = config.json_logs.then(|| fmt::layer().json().with_current_span(true));
    let text_layer = (!config.json_logs).then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| ServiceHubError::config(format!("Failed to initialize logging: {e}")))?;

    Ok(provider)
}

/// Flush pending spans and stop the exporter.
pub fn shutdown_tracing(provider: Option<SdkTracerProvider>) {
    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Failed to shut down tracer provider cleanly");
        }
    }
}
