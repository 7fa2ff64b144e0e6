//! Robot fleet protocol service library.
//!
//! A TCP service speaking newline-delimited JSON commands against a robot
//! store, plus the HTTP façade and client that talk to it.

// Wire protocol and command handling
pub mod catalog;
pub mod dispatch;
pub mod protocol;
pub mod store;

// Service and clients
pub mod client;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use client::{ClientError, ProtocolClient};
pub use config::FleetConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::ProtocolServer;
pub use store::{MemoryStore, StoreGateway};
