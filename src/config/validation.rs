//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, sizes > 0)
//! - Check the bind address parses as a socket address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }

    let positive = [
        ("server.read_timeout_secs", config.server.read_timeout_secs),
        ("server.write_timeout_secs", config.server.write_timeout_secs),
        ("server.idle_timeout_secs", config.server.idle_timeout_secs),
        ("server.shutdown_timeout_secs", config.server.shutdown_timeout_secs),
        ("server.max_connections", config.server.max_connections as u64),
        ("database.max_connections", u64::from(config.database.max_connections)),
        ("database.acquire_timeout_secs", config.database.acquire_timeout_secs),
        ("telemetry.export_timeout_secs", config.telemetry.export_timeout_secs),
        ("telemetry.flush_timeout_secs", config.telemetry.flush_timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::NotPositive(field));
        }
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::Empty("service.name"));
    }

    if config.telemetry.enabled && config.telemetry.otlp_endpoint.trim().is_empty() {
        errors.push(ValidationError::Empty("telemetry.otlp_endpoint"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_violation() {
        let mut config = AppConfig::default();
        config.server.bind_address = ":8080".into();
        config.server.shutdown_timeout_secs = 0;
        config.server.idle_timeout_secs = 0;
        config.service.name = "  ".into();

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: ":8080".into(),
        }));
        assert!(errors.contains(&ValidationError::NotPositive("server.shutdown_timeout_secs")));
        assert!(errors.contains(&ValidationError::NotPositive("server.idle_timeout_secs")));
        assert!(errors.contains(&ValidationError::Empty("service.name")));
    }

    #[test]
    fn endpoint_required_only_when_telemetry_enabled() {
        let mut config = AppConfig::default();
        config.telemetry.otlp_endpoint = String::new();
        assert!(validate_config(&config).is_ok());

        config.telemetry.enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::Empty("telemetry.otlp_endpoint")])
        );
    }
}
