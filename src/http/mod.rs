//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup)
//!     → request id + request span (observability::tracing)
//!     → panic guard (error.rs renders 500)
//!     → middleware/metrics.rs (count, simulate users, time)
//!     → handlers.rs (/fast, /slow, /error, fallback 404)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::AppError;
pub use server::{AppState, DemoServer};

/// Header carrying the request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";
