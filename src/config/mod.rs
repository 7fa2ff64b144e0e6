//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → FleetConfig (validated, immutable)
//!     → handed by value to the server, façade, and store
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError, CONFIG_ENV};
pub use schema::{
    FleetConfig, HttpConfig, ListenerConfig, ObservabilityConfig, ProtocolConfig, StoreConfig,
    TimeoutConfig,
};
pub use validation::{validate_seed, ValidationError};
