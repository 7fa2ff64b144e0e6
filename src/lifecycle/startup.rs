//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and metrics from configuration
//! - Open the store and verify it answers
//! - Bind the listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal (exit code 1)
//! - Subsystems initialize in order, not concurrently

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{
    validate_seed, ConfigError, FleetConfig, ObservabilityConfig, StoreConfig, ValidationError,
};
use crate::net::{Listener, ListenerError, ProtocolServer};
use crate::observability::{self, LoggingError};
use crate::store::{MemoryStore, StoreError, StoreGateway};

/// An unrecoverable startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("metrics setup failed: {0}")]
    Metrics(String),

    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("invalid seed file {}: {}", .path.display(), join(.errors))]
    Seed {
        path: PathBuf,
        errors: Vec<ValidationError>,
    },

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Install logging, then the metrics exporter when enabled.
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), StartupError> {
    observability::init_logging(config.log_format, &config.log_level)?;

    if config.metrics_enabled {
        let addr: SocketAddr = config
            .metrics_address
            .parse()
            .map_err(|e| StartupError::Metrics(format!("{}: {}", config.metrics_address, e)))?;
        observability::metrics::init_metrics(addr)
            .map_err(|e| StartupError::Metrics(e.to_string()))?;
    }
    Ok(())
}

/// Build the store from its seed sources and check that it answers.
///
/// Inline `robots` are applied after `seed_path` and win on id clashes.
/// Within the seed file itself ids must be unique.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<MemoryStore>, StartupError> {
    let mut records = match &config.seed_path {
        Some(path) => {
            let records = MemoryStore::load_seed(path).await?;
            let errors = validate_seed(&records);
            if !errors.is_empty() {
                return Err(StartupError::Seed {
                    path: path.clone(),
                    errors,
                });
            }
            records
        }
        None => Vec::new(),
    };
    records.extend(config.robots.iter().copied());

    let store = MemoryStore::new(config.pool_size, records);
    store.ping().await?;

    tracing::info!(
        robots = store.len(),
        pool_size = store.pool_size(),
        "Store ready"
    );
    Ok(Arc::new(store))
}

/// Open the store, build the server, and bind its listener.
pub async fn start_protocol_server(
    config: &FleetConfig,
) -> Result<(ProtocolServer, Listener), StartupError> {
    let store = open_store(&config.store).await?;
    let server = ProtocolServer::new(config, store);
    let listener = Listener::bind(&config.listener).await?;
    Ok((server, listener))
}
