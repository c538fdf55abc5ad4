//! Startup orchestration.
//!
//! # Responsibilities
//! - Bootstrap telemetry, then logging, before anything serves traffic
//! - Bind the HTTP listener and serve until a stop signal
//! - Flush telemetry on the way out
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is retried
//! - Listener binds last (traffic only when instrumentation is ready)

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{DemoConfig, Profile};
use crate::http::DemoServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, Telemetry};

/// Run the service with `config` until SIGINT/SIGTERM.
pub async fn run(config: DemoConfig) -> Result<(), Box<dyn Error>> {
    let shutdown = Arc::new(Shutdown::new());

    let telemetry = Telemetry::init(&config.telemetry(), &shutdown).await?;
    logging::init(&telemetry, &config.log_filter)?;
    announce(&config, &telemetry);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = DemoServer::new(&telemetry);

    let _signals = signals::spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    // Stops the scrape endpoint when the server ended on its own.
    shutdown.trigger();
    tokio::task::spawn_blocking(move || telemetry.shutdown()).await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn announce(config: &DemoConfig, telemetry: &Telemetry) {
    match telemetry.profile() {
        Profile::PushOtlp => {
            tracing::info!(
                profile = %telemetry.profile(),
                otlp_endpoint = %config.otlp_endpoint,
                "Setting up SigNoz instrumentation (OTLP: {})",
                config.otlp_endpoint
            );
        }
        Profile::PullPrometheus => {
            tracing::info!(profile = %telemetry.profile(), "Setting up Grafana Stack instrumentation");
            tracing::info!("  - Prometheus metrics on port {}", config.prometheus_port);
            if let Some(addr) = telemetry.scrape_addr() {
                tracing::info!(
                    address = %addr,
                    "Prometheus metrics available at http://{}/metrics",
                    addr
                );
            }
            tracing::info!("  - Tempo traces: {}", config.tempo_endpoint);
            tracing::debug!(loki_endpoint = %config.loki_endpoint, "Log shipping is not wired");
        }
    }

    tracing::info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        "OpenTelemetry instrumentation completed"
    );
}
