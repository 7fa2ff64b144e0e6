//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check seed records (unique ids, non-negative speed)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FleetConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FleetConfig;
use crate::store::RobotRecord;

/// Smallest frame limit that still fits every valid request.
pub const MIN_FRAME_BYTES: usize = 64;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    Address { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("protocol.max_frame_bytes must be at least {MIN_FRAME_BYTES}, got {0}")]
    FrameLimit(usize),

    #[error("duplicate seed robot id {0}")]
    DuplicateRobot(u32),

    #[error("seed robot {0} has negative speed")]
    NegativeSpeed(u32),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &FleetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("listener.bind_address", &config.listener.bind_address),
        ("http.bind_address", &config.http.bind_address),
    ] {
        check_address(&mut errors, field, value);
    }
    // Resolved at connect time, so a host name is fine.
    if split_host_port(&config.http.protocol_address).is_none() {
        errors.push(ValidationError::Address {
            field: "http.protocol_address",
            value: config.http.protocol_address.clone(),
        });
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    for (field, value) in [
        ("timeouts.idle_secs", config.timeouts.idle_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.write_secs", config.timeouts.write_secs),
        ("timeouts.shutdown_grace_secs", config.timeouts.shutdown_grace_secs),
        ("http.request_timeout_secs", config.http.request_timeout_secs),
        ("store.pool_size", config.store.pool_size as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.protocol.max_frame_bytes < MIN_FRAME_BYTES {
        errors.push(ValidationError::FrameLimit(config.protocol.max_frame_bytes));
    }

    errors.extend(validate_seed(&config.store.robots));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check one seed source: ids unique, speeds non-negative.
///
/// Ids are positive by construction of `RobotId`.
pub fn validate_seed(robots: &[RobotRecord]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for robot in robots {
        if !seen.insert(robot.id) {
            errors.push(ValidationError::DuplicateRobot(robot.id.get()));
        }
        if robot.speed < 0.0 {
            errors.push(ValidationError::NegativeSpeed(robot.id.get()));
        }
    }
    errors
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

/// Split `host:port`, requiring a non-empty host and a valid port.
pub(crate) fn split_host_port(address: &str) -> Option<(&str, u16)> {
    let (host, port) = address.rsplit_once(':')?;
    let port = port.parse().ok()?;
    (!host.is_empty()).then_some((host, port))
}
