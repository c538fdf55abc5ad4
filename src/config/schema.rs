//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the demo
//! service. All types derive Serde traits for deserialization from config
//! files; environment overrides are applied on top by the loader.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Export interval of the periodic OTLP metric reader.
pub const OTLP_METRIC_INTERVAL: Duration = Duration::from_millis(5000);

/// Root configuration for the demo service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Which observability backend the process reports to.
    pub setup_type: SetupType,

    /// OTLP collector used for traces and metrics in the SigNoz setup.
    pub otlp_endpoint: String,

    /// `service.name` resource attribute.
    pub service_name: String,

    /// `service.version` resource attribute.
    pub service_version: String,

    /// Local port of the Prometheus scrape endpoint (Grafana setup).
    pub prometheus_port: u16,

    /// OTLP collector used for traces in the Grafana setup.
    pub tempo_endpoint: String,

    /// Log aggregation endpoint. Declared for parity with the Grafana
    /// stack; logs are only written locally.
    pub loki_endpoint: String,

    /// Default `EnvFilter` directives when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Listener configuration for the demo HTTP service.
    pub listener: ListenerConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            setup_type: SetupType::Signoz,
            otlp_endpoint: "http://localhost:4319".to_string(),
            service_name: "fastapi-demo".to_string(),
            service_version: "1.0.0".to_string(),
            prometheus_port: 9091,
            tempo_endpoint: "http://localhost:4317".to_string(),
            loki_endpoint: "http://localhost:3100".to_string(),
            log_filter: "telemetry_demo=info,tower_http=info".to_string(),
            listener: ListenerConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Backend profile selected by `setup_type`.
    pub fn profile(&self) -> Profile {
        self.setup_type.profile()
    }

    /// Resolve the settings into the bootstrapper's input.
    pub fn telemetry(&self) -> TelemetryConfig {
        let (trace_endpoint, metrics) = match self.profile() {
            Profile::PushOtlp => (
                self.otlp_endpoint.clone(),
                MetricsExport::Otlp {
                    endpoint: self.otlp_endpoint.clone(),
                    interval: OTLP_METRIC_INTERVAL,
                },
            ),
            Profile::PullPrometheus => (
                self.tempo_endpoint.clone(),
                MetricsExport::Prometheus {
                    port: self.prometheus_port,
                },
            ),
        };

        TelemetryConfig {
            service_name: self.service_name.clone(),
            service_version: self.service_version.clone(),
            trace_endpoint,
            metrics,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Observability backend named the way operators know it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupType {
    /// SigNoz: OTLP for traces and metrics.
    Signoz,
    /// Grafana stack: Tempo for traces, Prometheus scrape for metrics.
    Grafana,
}

impl SetupType {
    pub fn profile(self) -> Profile {
        match self {
            SetupType::Signoz => Profile::PushOtlp,
            SetupType::Grafana => Profile::PullPrometheus,
        }
    }
}

impl FromStr for SetupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signoz" | "push-otlp" => Ok(SetupType::Signoz),
            "grafana" | "pull-prometheus" => Ok(SetupType::Grafana),
            other => Err(format!(
                "unknown setup type '{}' (expected signoz or grafana)",
                other
            )),
        }
    }
}

/// Telemetry wiring profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Push traces and metrics over OTLP.
    PushOtlp,
    /// Push traces over OTLP, serve metrics for scraping.
    PullPrometheus,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::PushOtlp => f.write_str("push-otlp"),
            Profile::PullPrometheus => f.write_str("pull-prometheus"),
        }
    }
}

/// How the metric pipeline leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsExport {
    /// Periodic push to an OTLP collector.
    Otlp { endpoint: String, interval: Duration },
    /// Pull-based reader served on a local port.
    Prometheus { port: u16 },
}

impl MetricsExport {
    pub fn profile(&self) -> Profile {
        match self {
            MetricsExport::Otlp { .. } => Profile::PushOtlp,
            MetricsExport::Prometheus { .. } => Profile::PullPrometheus,
        }
    }
}

/// Input of the telemetry bootstrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    /// OTLP/gRPC trace collector, used by both profiles.
    pub trace_endpoint: String,
    pub metrics: MetricsExport,
}

impl TelemetryConfig {
    pub fn profile(&self) -> Profile {
        self.metrics.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_to_push_otlp() {
        let config = DemoConfig::default();
        let telemetry = config.telemetry();

        assert_eq!(telemetry.profile(), Profile::PushOtlp);
        assert_eq!(telemetry.trace_endpoint, "http://localhost:4319");
        assert_eq!(telemetry.service_name, "fastapi-demo");
        assert_eq!(
            telemetry.metrics,
            MetricsExport::Otlp {
                endpoint: "http://localhost:4319".to_string(),
                interval: Duration::from_millis(5000),
            }
        );
    }

    #[test]
    fn test_grafana_uses_tempo_and_scrape_port() {
        let config = DemoConfig {
            setup_type: SetupType::Grafana,
            ..DemoConfig::default()
        };
        let telemetry = config.telemetry();

        assert_eq!(telemetry.profile(), Profile::PullPrometheus);
        assert_eq!(telemetry.trace_endpoint, "http://localhost:4317");
        assert_eq!(telemetry.metrics, MetricsExport::Prometheus { port: 9091 });
    }

    #[test]
    fn test_setup_type_parsing() {
        assert_eq!("signoz".parse::<SetupType>(), Ok(SetupType::Signoz));
        assert_eq!("Grafana".parse::<SetupType>(), Ok(SetupType::Grafana));
        assert_eq!("pull-prometheus".parse::<SetupType>(), Ok(SetupType::Grafana));
        assert!("datadog".parse::<SetupType>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DemoConfig = toml::from_str(
            r#"
            setup_type = "grafana"
            prometheus_port = 9500

            [listener]
            bind_address = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.setup_type, SetupType::Grafana);
        assert_eq!(config.prometheus_port, 9500);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.service_name, "fastapi-demo");
    }
}
