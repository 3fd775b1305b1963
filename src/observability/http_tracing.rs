//! # HTTP Request Tracing Middleware
//!
//! Axum middleware that opens an OpenTelemetry server span per request and
//! records request count and latency metrics.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::{
    global,
    trace::{FutureExt, Span, SpanKind, Status, TraceContextExt, Tracer},
    KeyValue,
};
use std::time::Instant;

use super::metrics;

/// Axum middleware that creates an OpenTelemetry span for each HTTP request
pub async fn trace_http_requests(request: Request, next: Next) -> Response {
    let tracer = global::tracer(crate::APP_NAME);

    let method = request.method().to_string();
    let route = route_label(&request);
    let start = Instant::now();

    let mut span = tracer
        .span_builder(format!("{} {}", method, route))
        .with_kind(SpanKind::Server)
        .start(&tracer);
    span.set_attribute(KeyValue::new("http.method", method.clone()));
    span.set_attribute(KeyValue::new("http.route", route.clone()));

    let cx = opentelemetry::Context::current().with_span(span);
    let response = next.run(request).with_context(cx.clone()).await;

    let status_code = response.status().as_u16();
    let elapsed = start.elapsed();

    let span = cx.span();
    span.set_attribute(KeyValue::new("http.status_code", i64::from(status_code)));
    if status_code >= 500 {
        span.set_status(Status::error("Server error"));
    } else {
        span.set_status(Status::Ok);
    }

    tracing::debug!(
        method = %method,
        route = %route,
        status_code,
        elapsed_ms = elapsed.as_millis(),
        "HTTP request completed"
    );
    metrics::record_http_request(&method, &route, status_code, elapsed.as_secs_f64()).await;

    response
}

/// Route template for the request, keeping metric label cardinality bounded.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}
