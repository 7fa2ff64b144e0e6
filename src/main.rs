//! Robot fleet protocol service.
//!
//! # Architecture Overview
//!
//! ```text
//!   fleet-http / fleet-cli
//!          │  one TCP connection per request, NDJSON
//!          ▼
//!   ┌───────────────────────────────────────────────────────────┐
//!   │  net::ProtocolServer                                      │
//!   │     listener ─▶ session (framing, idle timeout, panics)   │
//!   │                    │                                      │
//!   │                    ▼                                      │
//!   │              dispatch::Dispatcher ─▶ catalog (schema)     │
//!   │                    │                                      │
//!   │                    ▼                                      │
//!   │              store::StoreGateway (pool-bounded)           │
//!   │                                                           │
//!   │  config · lifecycle · observability                       │
//!   └───────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use robot_fleet::config::load_config;
use robot_fleet::lifecycle::{init_observability, spawn_signal_handler, start_protocol_server};
use robot_fleet::Shutdown;

#[derive(Parser)]
#[command(name = "robot-fleet", version, about = "Robot fleet TCP protocol service")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "ROBOT_FLEET_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_observability(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        idle_timeout_secs = config.timeouts.idle_secs,
        pool_size = config.store.pool_size,
        "robot-fleet starting"
    );

    let (server, listener) = start_protocol_server(&config)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Startup failed"))?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
