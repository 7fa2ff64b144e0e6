//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::observability::LogFormat;
use crate::protocol::DEFAULT_MAX_FRAME_BYTES;
use crate::store::RobotRecord;

/// Root configuration shared by the service and the HTTP façade.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Protocol listener settings.
    pub listener: ListenerConfig,

    /// Wire protocol settings.
    pub protocol: ProtocolConfig,

    /// Connection and request deadlines.
    pub timeouts: TimeoutConfig,

    /// Store Gateway settings.
    pub store: StoreConfig,

    /// HTTP façade settings.
    pub http: HttpConfig,

    pub observability: ObservabilityConfig,
}

/// Protocol listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3002").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3002".to_string(),
        }
    }
}

/// Wire protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Largest accepted request frame, excluding the delimiter.
    pub max_frame_bytes: usize,

    /// Greet each connection with the list of commands.
    pub send_welcome: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            send_welcome: true,
        }
    }
}

/// Timeout configuration, all in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Close a connection after this long without a request.
    pub idle_secs: u64,

    /// Deadline for dispatching one request.
    pub request_secs: u64,

    /// Deadline for writing one response.
    pub write_secs: u64,

    /// How long shutdown waits for connections to drain.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            idle_secs: 300,
            request_secs: 30,
            write_secs: 10,
            shutdown_grace_secs: 10,
        }
    }
}

/// Store Gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Concurrent store operations before callers queue.
    pub pool_size: usize,

    /// JSON file holding an array of robot records.
    pub seed_path: Option<PathBuf>,

    /// Inline seed records, loaded after `seed_path`.
    pub robots: Vec<RobotRecord>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            seed_path: None,
            robots: Vec::new(),
        }
    }
}

/// HTTP façade configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address of the REST API.
    pub bind_address: String,

    /// Address of the protocol service the façade forwards to.
    pub protocol_address: String,

    /// Deadline for one protocol round trip, and for the whole HTTP request.
    pub request_timeout_secs: u64,

    /// Allowed CORS origin. Any origin when unset.
    pub frontend_origin: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            protocol_address: "127.0.0.1:3002".to_string(),
            request_timeout_secs: 5,
            frontend_origin: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
