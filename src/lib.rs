//! Telemetry demo service library.
//!
//! Three HTTP endpoints with different latency and error behaviour,
//! instrumented with OpenTelemetry traces, metrics and trace-correlated
//! logs. Metrics are pushed over OTLP or served for Prometheus scraping,
//! depending on the configured backend.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::DemoConfig;
pub use http::DemoServer;
pub use lifecycle::Shutdown;
pub use observability::Telemetry;
