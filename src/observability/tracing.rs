//! Automatic request tracing.
//!
//! # Responsibilities
//! - Open a server span around every request, with no per-route code
//! - Generate `x-request-id` when the client sends none and echo it back
//! - Record the response status on the span and flag 5xx as errors
//!
//! # Design Decisions
//! - Built on tower-http's `TraceLayer`; spans become OpenTelemetry spans
//!   through the subscriber's `tracing-opentelemetry` layer
//! - The layer's own failure event is DEBUG: application errors are logged
//!   once, by the code that raised them

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnFailure, DefaultOnRequest, TraceLayer},
};
use tracing::{field, Level, Span};

use crate::http::X_REQUEST_ID;

/// Wrap every route of `router` in a request span.
///
/// Must be applied after all routes and the fallback are registered.
pub fn instrument(router: Router) -> Router {
    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(record_response)
                .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn make_request_span(request: &Request<Body>) -> Span {
    let method = request.method();
    let path = request.uri().path();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "HTTP request",
        otel.kind = "server",
        otel.name = %format!("{} {}", method, path),
        http.request.method = %method,
        url.path = %path,
        request_id = %request_id,
        http.response.status_code = field::Empty,
        otel.status_code = field::Empty,
    )
}

fn record_response(response: &Response<Body>, latency: Duration, span: &Span) {
    let status = response.status();
    span.record("http.response.status_code", status.as_u16());
    if status.is_server_error() {
        span.record("otel.status_code", "ERROR");
    }

    tracing::debug!(
        parent: span,
        status = status.as_u16(),
        latency_ms = latency.as_millis() as u64,
        "Finished processing request"
    );
}
