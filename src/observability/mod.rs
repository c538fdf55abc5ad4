//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! TelemetryConfig
//!     → telemetry.rs (resource, trace pipeline, metric pipeline)
//!         ├─ push-otlp:       PeriodicReader → OTLP/gRPC collector
//!         └─ pull-prometheus: Prometheus reader → scrape.rs (/metrics)
//!     → logging.rs (subscriber, OTel span bridge, trace-correlated lines)
//!     → tracing.rs (server span around every request)
//!     → metrics.rs (request instruments, live-user simulation)
//! ```
//!
//! # Design Decisions
//! - Traces always leave the process over OTLP; only metrics differ
//! - Handles are explicit (`Telemetry`, `Instruments`), not global lookups
//! - Instrument updates are lock-free from the application's view

pub mod logging;
pub mod metrics;
pub mod scrape;
pub mod telemetry;
pub mod tracing;

pub use metrics::{Instruments, LiveUsers, UserChange};
pub use telemetry::{Telemetry, TelemetryError};
