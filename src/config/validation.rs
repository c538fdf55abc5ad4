//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that collector endpoints are absolute plaintext http URLs
//! - Check the listener address and resource identity
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DemoConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::DemoConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid endpoint ({reason})")]
    InvalidEndpoint {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("listener.bind_address: '{0}' is not a socket address")]
    InvalidBindAddress(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let endpoints = [
        ("otlp_endpoint", &config.otlp_endpoint),
        ("tempo_endpoint", &config.tempo_endpoint),
        ("loki_endpoint", &config.loki_endpoint),
    ];
    for (field, value) in endpoints {
        if let Err(e) = check_endpoint(field, value) {
            errors.push(e);
        }
    }

    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "service_name",
        });
    }
    if config.service_version.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "service_version",
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidEndpoint {
        field,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" => {}
        "https" => return Err(invalid("TLS collectors are not supported".to_string())),
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
