//! surge - demand-responsive pricing service.

use anyhow::Result;
use clap::Parser;
use surge_bot::config::{CONFIG_ENV, DEFAULT_CONFIG_PATH};
use tracing::info;

/// Demand-responsive pricing service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SURGE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI arg > SURGE_CONFIG > default path
    let config_path = args
        .config
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = surge_bot::AppConfig::load_or_default(&config_path)?;
    surge_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting surge v{}", env!("CARGO_PKG_VERSION"));
    info!(config_path = %config_path, oracle = ?config.oracle.kind, "Configuration loaded");

    let app = surge_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
