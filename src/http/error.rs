//! Application errors and their HTTP rendering.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error body in the `{"detail": ...}` shape clients of the demo expect.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Failures surfaced by request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Internal,

    #[error("Not Found")]
    NotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Response for a handler that panicked. The panic payload is not leaked
/// to the client.
pub fn panic_response(_payload: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal.into_response()
}
