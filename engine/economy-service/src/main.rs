//! Fantasy Economy Service
//!
//! Loads configuration and seed data, then runs the auto-lock scheduler until
//! Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use economy_service::{
    graceful_shutdown, initialize_logging, load_configuration, setup_signal_handlers, ServiceState,
};

#[derive(Parser)]
#[command(name = "economy-service")]
#[command(about = "Fantasy F1 economy and roster lock service")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed file with races, assets and league policies
    #[arg(short, long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_configuration(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.service.seed_file = cli.seed;
    }

    initialize_logging(&config.logging)?;
    info!("Starting Fantasy Economy Service v{}", env!("CARGO_PKG_VERSION"));

    let service_state = Arc::new(ServiceState::new(config).await?);
    service_state.load_seed().await.context("Failed to load seed data")?;
    info!("Service state initialized");

    let mut shutdown_signal = setup_signal_handlers()?;
    info!("Signal handlers configured");

    let scheduler_handle = {
        let state = service_state.clone();
        tokio::spawn(async move {
            if let Err(e) = state.start_scheduler().await {
                error!("AutoLockScheduler failed: {}", e);
            }
        })
    };

    info!("Fantasy Economy Service is running. Press Ctrl+C to shutdown gracefully.");
    let _ = shutdown_signal.recv().await;

    info!("Shutdown signal received. Initiating graceful shutdown...");
    graceful_shutdown(service_state, scheduler_handle).await?;

    info!("Fantasy Economy Service shutdown complete");
    Ok(())
}
