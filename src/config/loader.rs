//! Configuration loading from disk and environment.
//!
//! Order: defaults → TOML file (optional) → environment overrides →
//! validation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::FleetConfig;
use crate::config::validation::{split_host_port, validate_config, ValidationError};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ROBOT_FLEET_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable {var}='{value}' is invalid: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from `path` (or defaults when `None`), apply the
/// process environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<FleetConfig, ConfigError> {
    load_config_with(path, |var| std::env::var(var).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<FleetConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => FleetConfig::default(),
    };
    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<FleetConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `TCP_PORT`, `TCP_HOST`, `PORT` and `FRONTEND_URL`.
pub fn apply_env_overrides(
    config: &mut FleetConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(raw) = env("TCP_PORT") {
        let port = parse_port("TCP_PORT", &raw)?;
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
        config.http.protocol_address = with_port(&config.http.protocol_address, port);
    }
    if let Some(host) = env("TCP_HOST") {
        let port = split_host_port(&config.http.protocol_address)
            .map(|(_, port)| port)
            .ok_or_else(|| ConfigError::Env {
                var: "TCP_HOST",
                value: host.clone(),
                reason: format!("no port in '{}'", config.http.protocol_address),
            })?;
        config.http.protocol_address = format!("{}:{}", host, port);
    }
    if let Some(raw) = env("PORT") {
        let port = parse_port("PORT", &raw)?;
        config.http.bind_address = with_port(&config.http.bind_address, port);
    }
    if let Some(origin) = env("FRONTEND_URL").filter(|origin| !origin.is_empty()) {
        config.http.frontend_origin = Some(origin);
    }
    Ok(())
}

fn parse_port(var: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Env {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Replace the port of a `host:port` address, keeping the host.
fn with_port(address: &str, port: u16) -> String {
    match address.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", address, port),
    }
}
