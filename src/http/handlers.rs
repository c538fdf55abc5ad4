//! Demo route handlers.
//!
//! Each handler opens its own span under the request span, so a trace for
//! `/slow` shows the request span and a `slow_endpoint` child covering the
//! delay.

use std::time::Duration;

use axum::Json;
use serde::Serialize;
use tracing::{field, Instrument, Span};

use crate::http::error::AppError;

/// Delay applied by `/slow`.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// `GET /fast`: quick successful response.
pub async fn fast() -> Json<Message> {
    let span = tracing::info_span!(
        "fast_endpoint",
        endpoint = "/fast",
        response_time = "fast"
    );
    span.in_scope(|| tracing::info!("Processing fast request"));

    Json(Message {
        message: "fast response",
    })
}

/// `GET /slow`: succeeds after [`SLOW_DELAY`].
///
/// The delay is a timer await, so other requests keep running meanwhile.
pub async fn slow() -> Json<Message> {
    let span = tracing::info_span!(
        "slow_endpoint",
        endpoint = "/slow",
        delay_seconds = SLOW_DELAY.as_secs(),
        completed = field::Empty
    );

    async {
        tracing::info!(
            "Processing slow request - will delay {} seconds",
            SLOW_DELAY.as_secs()
        );
        tokio::time::sleep(SLOW_DELAY).await;

        Span::current().record("completed", true);
        tracing::info!("Slow request completed");
    }
    .instrument(span)
    .await;

    Json(Message {
        message: "slow response",
    })
}

/// `GET /error`: always fails with 500 and logs one error record.
pub async fn error() -> Result<Json<Message>, AppError> {
    let span = tracing::info_span!(
        "error_endpoint",
        endpoint = "/error",
        otel.status_code = "ERROR",
        otel.status_message = "Intentional error for testing"
    );
    span.in_scope(|| {
        tracing::error!(
            error_type = "test_error",
            endpoint = "/error",
            "Something went wrong! This is a test error."
        );
    });

    Err(AppError::Internal)
}

/// Fallback for unknown paths.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
