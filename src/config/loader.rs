//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{DemoConfig, SetupType};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "DEMO_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DemoConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: DemoConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the process configuration: defaults, then the file named by
/// `DEMO_CONFIG` (if any), then environment overrides.
pub fn from_env() -> Result<DemoConfig, ConfigError> {
    let lookup = |key: &str| std::env::var(key).ok();

    let base = match lookup(CONFIG_PATH_VAR) {
        Some(path) => {
            let content = fs::read_to_string(PathBuf::from(path))?;
            toml::from_str(&content)?
        }
        None => DemoConfig::default(),
    };

    let config = apply_env(base, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment-style settings on `config`.
///
/// `lookup` returns the raw value of a variable, or `None` when unset.
pub fn apply_env<F>(mut config: DemoConfig, lookup: F) -> Result<DemoConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("SETUP_TYPE") {
        config.setup_type = value.parse::<SetupType>().map_err(|reason| ConfigError::Env {
            key: "SETUP_TYPE",
            value: value.clone(),
            reason,
        })?;
    }
    if let Some(value) = lookup("PROMETHEUS_PORT") {
        config.prometheus_port = value.trim().parse::<u16>().map_err(|e| {
            ConfigError::Env {
                key: "PROMETHEUS_PORT",
                value: value.clone(),
                reason: e.to_string(),
            }
        })?;
    }

    let strings: [(&str, &mut String); 7] = [
        ("OTLP_ENDPOINT", &mut config.otlp_endpoint),
        ("SERVICE_NAME", &mut config.service_name),
        ("SERVICE_VERSION", &mut config.service_version),
        ("TEMPO_ENDPOINT", &mut config.tempo_endpoint),
        ("LOKI_ENDPOINT", &mut config.loki_endpoint),
        ("LOG_FILTER", &mut config.log_filter),
        ("BIND_ADDRESS", &mut config.listener.bind_address),
    ];
    for (key, field) in strings {
        if let Some(value) = lookup(key) {
            *field = value;
        }
    }

    Ok(config)
}
