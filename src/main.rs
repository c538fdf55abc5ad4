//! Telemetry demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                 DEMO SERVICE                   │
//!   Client Request    │  ┌───────────┐   ┌────────────┐   ┌──────────┐ │
//!   ──────────────────┼─▶│ request   │──▶│  metrics   │──▶│ handlers │ │
//!                     │  │ id + span │   │ middleware │   │ fast/slow│ │
//!                     │  └───────────┘   └─────┬──────┘   │  /error  │ │
//!                     │                        │          └──────────┘ │
//!                     │                        ▼                       │
//!                     │  ┌──────────────────────────────────────────┐  │
//!                     │  │              observability               │  │
//!                     │  │  traces ──▶ OTLP (SigNoz / Tempo)        │  │
//!                     │  │  metrics ─▶ OTLP push | /metrics scrape  │  │
//!                     │  │  logs ────▶ stdout with trace/span ids   │  │
//!                     │  └──────────────────────────────────────────┘  │
//!                     └────────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from the environment (`SETUP_TYPE`, `OTLP_ENDPOINT`,
//! `SERVICE_NAME`, `PROMETHEUS_PORT`, `TEMPO_ENDPOINT`, ...), optionally on
//! top of a TOML file named by `DEMO_CONFIG`.

use telemetry_demo::config;
use telemetry_demo::lifecycle::startup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::from_env()?;
    startup::run(config).await
}
