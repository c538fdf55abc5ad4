//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file named by DEMO_CONFIG (loader.rs)
//!     → environment overrides: SETUP_TYPE, OTLP_ENDPOINT, ... (loader.rs)
//!     → validation.rs (semantic checks)
//!     → DemoConfig (validated, immutable)
//!     → DemoConfig::telemetry() → TelemetryConfig for the bootstrapper
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - All fields have defaults so an empty environment is a valid setup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, from_env, load_config};
pub use schema::{DemoConfig, ListenerConfig, MetricsExport, Profile, SetupType, TelemetryConfig};
pub use validation::ValidationError;
