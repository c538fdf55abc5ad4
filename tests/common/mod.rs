//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use opentelemetry::metrics::MeterProvider as _;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use telemetry_demo::http::AppState;
use telemetry_demo::observability::Instruments;
use telemetry_demo::{DemoServer, Shutdown};
use tokio::net::TcpListener;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Application state whose instruments feed a Prometheus registry.
///
/// Keep the provider alive for as long as the registry is read.
pub fn metered_state() -> (AppState, Registry, SdkMeterProvider) {
    let registry = Registry::new();
    let reader = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .without_units()
        .without_counter_suffixes()
        .without_scope_info()
        .build()
        .unwrap();
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let instruments = Instruments::new(&provider.meter("integration-tests"));

    (AppState::new(instruments), registry, provider)
}

/// Serve `server` on an ephemeral local port.
pub async fn spawn_server(server: DemoServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Value of the first sample of `metric` whose labels contain every
/// `label="value"` pair given.
pub fn sample(exposition: &str, metric: &str, labels: &[(&str, &str)]) -> Option<f64> {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| line.starts_with(&format!("{}{{", metric)) || line.starts_with(&format!("{} ", metric)))
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{}=\"{}\"", k, v)))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

/// Layer counting ERROR-level events.
#[derive(Clone, Default)]
pub struct ErrorCounter(pub Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
