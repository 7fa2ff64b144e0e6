use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use robot_fleet::protocol::Envelope;
use robot_fleet::{ClientError, ProtocolClient};

#[derive(Parser)]
#[command(name = "fleet-cli")]
#[command(about = "Send single commands to the robot fleet service", long_about = None)]
struct Cli {
    /// Protocol service address.
    #[arg(short, long, env = "FLEET_ADDR", default_value = "127.0.0.1:3002")]
    addr: String,

    /// Seconds to wait for a response.
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service answers
    Ping,
    /// List all robots
    List,
    /// Show one robot
    Get { id: u32 },
    /// List robot positions
    Positions,
    /// Move a robot
    SetPosition {
        id: u32,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        /// Battery level; the service assumes 100 when omitted
        #[arg(long)]
        battery: Option<f64>,
    },
    /// Set a robot's speed
    SetSpeed { id: u32, speed: f64 },
    /// Set a robot's battery level
    SetBattery { id: u32, battery: f64 },
    /// Send one line as is, e.g. '{"command":"PING"}'
    Raw { json: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = ProtocolClient::new(cli.addr, Duration::from_secs(cli.timeout));

    match execute(&client, cli.command).await {
        Ok(envelope) => {
            match serde_json::to_string_pretty(&envelope) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("error: {}", e),
            }
            if envelope.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn execute(client: &ProtocolClient, command: Commands) -> Result<Envelope, ClientError> {
    match command {
        Commands::Ping => client.ping().await,
        Commands::List => client.get_all_robots().await,
        Commands::Get { id } => client.get_robot_by_id(id).await,
        Commands::Positions => client.get_robot_positions().await,
        Commands::SetPosition { id, x, y, battery } => {
            client
                .update_robot_position(id, x, y, battery.map(Value::from))
                .await
        }
        Commands::SetSpeed { id, speed } => client.update_robot_speed(id, speed).await,
        Commands::SetBattery { id, battery } => client.update_robot_battery(id, battery).await,
        Commands::Raw { json } => client.send_line(&json).await,
    }
}
