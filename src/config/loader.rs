//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {key}")]
    Env { key: &'static str, value: String },

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

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests do not touch process state.
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("SERVICE_NAME") {
        config.service.name = v;
    }
    if let Some(v) = get("SERVICE_VERSION") {
        config.service.version = v;
    }
    if let Some(v) = get("SERVER_ADDRESS") {
        config.server.bind_address = v;
    }
    if let Some(v) = get("SERVER_READ_TIMEOUT_SECS") {
        config.server.read_timeout_secs = parse("SERVER_READ_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = get("SERVER_WRITE_TIMEOUT_SECS") {
        config.server.write_timeout_secs = parse("SERVER_WRITE_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = get("SERVER_IDLE_TIMEOUT_SECS") {
        config.server.idle_timeout_secs = parse("SERVER_IDLE_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = get("SERVER_SHUTDOWN_TIMEOUT_SECS") {
        config.server.shutdown_timeout_secs = parse("SERVER_SHUTDOWN_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = get("DATABASE_URL") {
        config.database.url = Some(v);
    }
    if let Some(v) = get("DB_MAX_CONNECTIONS") {
        config.database.max_connections = parse("DB_MAX_CONNECTIONS", v)?;
    }
    if let Some(v) = get("TELEMETRY_ENABLED") {
        config.telemetry.enabled = parse_bool("TELEMETRY_ENABLED", v)?;
    }
    if let Some(v) = get("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = v;
    }
    if let Some(v) = get("LOG_LEVEL") {
        config.logging.level = v;
    }
    if let Some(v) = get("LOG_FORMAT") {
        config.logging.format = parse("LOG_FORMAT", v)?;
    }

    Ok(())
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Env { key, value }),
    }
}
