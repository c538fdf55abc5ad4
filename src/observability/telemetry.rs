//! Telemetry bootstrap.
//!
//! # Responsibilities
//! - Build the resource descriptor (service name and version)
//! - Build the trace pipeline: one batching OTLP/gRPC span processor
//! - Build the metric pipeline with the profile's single reader
//! - Start the scrape endpoint for the pull profile
//! - Flush and shut down both pipelines on exit
//!
//! # Design Decisions
//! - Traces are always pushed over OTLP; only the metrics transport differs
//! - The profile is matched once here, never in request code
//! - Providers are owned by `Telemetry` and handed out explicitly; nothing
//!   is registered in the OpenTelemetry globals
//! - Any construction failure aborts startup, there is no fallback

use std::net::SocketAddr;
use std::time::Duration;

use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{BatchSpanProcessor, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use prometheus::Registry;
use thiserror::Error;

use crate::config::{MetricsExport, Profile, TelemetryConfig};
use crate::lifecycle::Shutdown;
use crate::observability::scrape::ScrapeServer;

/// Instrumentation scope used for the tracer and meter.
pub const INSTRUMENTATION_SCOPE: &str = "telemetry-demo";

/// Errors raised while bootstrapping or tearing down telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build {signal} exporter for {endpoint}: {reason}")]
    Exporter {
        signal: &'static str,
        endpoint: String,
        reason: String,
    },

    #[error("failed to bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),

    #[error("failed to shut down telemetry: {0}")]
    Shutdown(String),
}

/// Process-wide telemetry pipelines.
pub struct Telemetry {
    profile: Profile,
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
    scrape: Option<ScrapeServer>,
}

impl Telemetry {
    /// Build the trace and metric pipelines described by `config`.
    ///
    /// For the pull profile the scrape listener is bound before returning
    /// and stops when `shutdown` fires.
    pub async fn init(config: &TelemetryConfig, shutdown: &Shutdown) -> Result<Self, TelemetryError> {
        let resource = build_resource(config);
        let tracer_provider = build_tracer_provider(&config.trace_endpoint, resource.clone())?;

        let (meter_provider, scrape) = match &config.metrics {
            MetricsExport::Otlp { endpoint, interval } => {
                let provider = build_otlp_meter_provider(endpoint, *interval, resource)?;
                (provider, None)
            }
            MetricsExport::Prometheus { port } => {
                let registry = Registry::new();
                let provider = build_prometheus_meter_provider(&registry, resource)?;

                let addr = SocketAddr::from(([0, 0, 0, 0], *port));
                let server = ScrapeServer::start(addr, registry, shutdown.subscribe())
                    .await
                    .map_err(|source| TelemetryError::Bind { addr, source })?;
                (provider, Some(server))
            }
        };

        Ok(Self {
            profile: config.profile(),
            tracer_provider,
            meter_provider,
            scrape,
        })
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Tracer bound into the log subscriber's OpenTelemetry layer.
    pub fn tracer(&self) -> Tracer {
        self.tracer_provider.tracer(INSTRUMENTATION_SCOPE)
    }

    /// Meter used to create the request instruments.
    pub fn meter(&self) -> Meter {
        self.meter_provider.meter(INSTRUMENTATION_SCOPE)
    }

    /// Address of the scrape endpoint, pull profile only.
    pub fn scrape_addr(&self) -> Option<SocketAddr> {
        self.scrape.as_ref().map(ScrapeServer::local_addr)
    }

    /// Flush pending spans and metrics, then stop both pipelines.
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        if let Some(scrape) = &self.scrape {
            scrape.abort();
        }

        let traces = self.tracer_provider.shutdown();
        let metrics = self.meter_provider.shutdown();

        traces.map_err(|e| TelemetryError::Shutdown(e.to_string()))?;
        metrics.map_err(|e| TelemetryError::Shutdown(e.to_string()))?;
        Ok(())
    }
}

/// Service identity merged over the SDK's default resource.
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    Resource::default().merge(&Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
    ]))
}

#[allow(deprecated)]
fn build_tracer_provider(endpoint: &str, resource: Resource) -> Result<TracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter {
            signal: "trace",
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio).build();

    Ok(TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_span_processor(processor)
        .build())
}

fn build_otlp_meter_provider(
    endpoint: &str,
    interval: Duration,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter {
            signal: "metric",
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    let reader = PeriodicReader::builder(exporter, runtime::Tokio)
        .with_interval(interval)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build())
}

fn build_prometheus_meter_provider(
    registry: &Registry,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    let reader = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .without_units()
        .without_counter_suffixes()
        .without_scope_info()
        .build()
        .map_err(|e| TelemetryError::Exporter {
            signal: "prometheus",
            endpoint: "registry".to_string(),
            reason: e.to_string(),
        })?;

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::scrape::render;
    use opentelemetry::metrics::MeterProvider as _;

    fn pull_config() -> TelemetryConfig {
        TelemetryConfig {
            service_name: "fastapi-demo".to_string(),
            service_version: "1.0.0".to_string(),
            trace_endpoint: "http://localhost:4317".to_string(),
            metrics: MetricsExport::Prometheus { port: 0 },
        }
    }

    #[test]
    fn test_resource_carries_service_identity() {
        let resource = build_resource(&pull_config());

        assert_eq!(
            resource.get("service.name".into()).map(|v| v.to_string()),
            Some("fastapi-demo".to_string())
        );
        assert_eq!(
            resource.get("service.version".into()).map(|v| v.to_string()),
            Some("1.0.0".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pull_profile_serves_scrape_endpoint() {
        let shutdown = Shutdown::new();
        let telemetry = Telemetry::init(&pull_config(), &shutdown).await.unwrap();

        assert_eq!(telemetry.profile(), Profile::PullPrometheus);
        let addr = telemetry.scrape_addr().expect("pull profile binds a port");
        assert_ne!(addr.port(), 0);

        shutdown.trigger();
        telemetry.shutdown().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_push_profile_has_no_scrape_endpoint() {
        let shutdown = Shutdown::new();
        let config = TelemetryConfig {
            trace_endpoint: "http://localhost:4319".to_string(),
            metrics: MetricsExport::Otlp {
                endpoint: "http://localhost:4319".to_string(),
                interval: Duration::from_millis(5000),
            },
            ..pull_config()
        };

        let telemetry = Telemetry::init(&config, &shutdown).await.unwrap();
        assert_eq!(telemetry.profile(), Profile::PushOtlp);
        assert!(telemetry.scrape_addr().is_none());

        // Nothing listens on the collector port; only the teardown path matters here.
        let _ = telemetry.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_busy_scrape_port_aborts_init() {
        let shutdown = Shutdown::new();
        let first = Telemetry::init(&pull_config(), &shutdown).await.unwrap();
        let port = first.scrape_addr().unwrap().port();

        let config = TelemetryConfig {
            metrics: MetricsExport::Prometheus { port },
            ..pull_config()
        };
        let err = Telemetry::init(&config, &shutdown).await.err().unwrap();
        assert!(matches!(err, TelemetryError::Bind { .. }));

        shutdown.trigger();
    }

    #[test]
    fn test_prometheus_reader_exports_instruments() {
        let registry = Registry::new();
        let provider =
            build_prometheus_meter_provider(&registry, build_resource(&pull_config())).unwrap();

        let counter = provider
            .meter(INSTRUMENTATION_SCOPE)
            .u64_counter("http_requests_total")
            .build();
        counter.add(4, &[KeyValue::new("path", "/fast")]);

        let text = render(&registry).unwrap();
        let line = text
            .lines()
            .find(|l| l.starts_with("http_requests_total{") && l.contains("path=\"/fast\""))
            .expect("counter exported");
        assert!(line.ends_with(" 4"));
    }
}
