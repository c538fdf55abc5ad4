//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Telemetry → Logging → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Flush telemetry → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: telemetry first, listeners last
//! - One broadcast stops both the HTTP server and the scrape endpoint

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
