//! # Metrics Collection
//!
//! Prometheus metrics for HTTP traffic, authentication outcomes and account
//! workflow actions. Recording is a no-op until [`init_metrics`] installs the
//! exporter.

use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ObservabilityConfig;
use crate::domain::ActivityKind;
use crate::errors::{Result, ServiceHubError};

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration: f64) {
        let request_labels = [("method", method.to_string()), ("path", path.to_string())];
        counter!("http_requests_total", &request_labels).increment(1);

        let status_label = [("status", status.to_string())];
        counter!("http_responses_total", &status_label).increment(1);

        histogram!("http_request_duration_seconds", &request_labels).record(duration);
    }

    /// Record authentication attempt outcome
    pub fn record_authentication(&self, status: &str) {
        let labels = [("status", status.to_string())];
        counter!("auth_authentications_total", &labels).increment(1);
    }

    /// Record a completed account workflow action
    pub fn record_account_action(&self, action: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("action", action.to_string()), ("status", status.to_string())];
        counter!("account_actions_total", &labels).increment(1);
    }

    /// Record an activity log write that could not be persisted
    pub fn record_activity_log_failure(&self, activity: &str) {
        let labels = [("activity", activity.to_string())];
        counter!("account_activity_log_failures_total", &labels).increment(1);
    }

    /// Register auth and account metrics with zeroed series
    pub fn register_account_metrics(&self) {
        describe_counter!(
            "auth_authentications_total",
            Unit::Count,
            "Authentication attempts grouped by outcome"
        );
        describe_counter!(
            "account_actions_total",
            Unit::Count,
            "Account workflow actions grouped by action and outcome"
        );
        describe_counter!(
            "account_activity_log_failures_total",
            Unit::Count,
            "Activity log entries that could not be recorded"
        );
        describe_counter!("http_requests_total", Unit::Count, "HTTP requests received");
        describe_histogram!(
            "http_request_duration_seconds",
            Unit::Seconds,
            "HTTP request latency"
        );

        const STATUSES: &[&str] = &[
            "success",
            "invalid_credentials",
            "missing_token",
            "invalid_token",
            "expired_token",
            "wrong_token_purpose",
            "error",
        ];
        for status in STATUSES {
            counter!("auth_authentications_total", "status" => *status).absolute(0);
        }

        for kind in ActivityKind::ALL {
            counter!("account_actions_total", "action" => kind.as_str(), "status" => "success")
                .absolute(0);
        }
    }
}

/// Global metrics recorder instance
static METRICS: once_cell::sync::Lazy<Arc<RwLock<Option<MetricsRecorder>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(RwLock::new(None)));

/// Initialize metrics collection and Prometheus exporter
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        ServiceHubError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| {
            ServiceHubError::config(format!("Failed to initialize metrics exporter: {}", e))
        })?;

    let recorder = MetricsRecorder::new();
    {
        let mut metrics = METRICS.write().await;
        *metrics = Some(recorder.clone());
    }
    recorder.register_account_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}

/// Get the global metrics recorder
pub async fn get_metrics() -> Option<MetricsRecorder> {
    METRICS.read().await.clone()
}

/// Record an HTTP request using the global metrics recorder
pub async fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_http_request(method, path, status, duration);
    }
}

/// Record authentication attempt outcome via the global recorder
pub async fn record_authentication(status: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_authentication(status);
    }
}

/// Record an account workflow action via the global recorder
pub async fn record_account_action(action: &str, success: bool) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_account_action(action, success);
    }
}

/// Record a failed activity log write via the global recorder
pub async fn record_activity_log_failure(activity: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_activity_log_failure(activity);
    }
}
