//! HTTP façade for the robot fleet protocol service.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use robot_fleet::config::load_config;
use robot_fleet::lifecycle::{init_observability, spawn_signal_handler};
use robot_fleet::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "fleet-http", version, about = "REST API in front of the robot fleet service")]
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
        bind_address = %config.http.bind_address,
        protocol_address = %config.http.protocol_address,
        frontend_origin = config.http.frontend_origin.as_deref().unwrap_or("*"),
        "fleet-http starting"
    );

    let server = HttpServer::new(&config.http)?;
    let listener = TcpListener::bind(&config.http.bind_address)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to bind HTTP listener"))?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
