use anyhow::{Context, Result};
use assignment_pilot::cli::context::CliContext;
use assignment_pilot::cli::dispatch::dispatch;
use assignment_pilot::cli::env::CliArgs;
use assignment_pilot::cli::runtime::init_logging;
use assignment_pilot::{metrics, PilotConfig};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // EMAIL / PASSWORD and PILOT__* may come from .env
    let dotenv = dotenvy::dotenv();
    let cli = CliArgs::parse();

    let log_guard = init_logging(&cli.logging_options())?;
    if let Ok(path) = &dotenv {
        info!(path = %path.display(), "Loaded environment from .env");
    }
    let _metrics_server = metrics::spawn_metrics_server(cli.metrics_port);

    info!("Starting assignment-pilot v{}", env!("CARGO_PKG_VERSION"));

    let loaded =
        PilotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let ctx = CliContext::new(loaded.config, loaded.path);

    match dispatch(&cli, &ctx).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            drop(log_guard);
            std::process::exit(1);
        }
    }
}
