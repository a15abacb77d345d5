// server/src/cli/cli.rs

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use lib::config::load_app_config;

use crate::cli::commands::{CliArgs, Commands};
use crate::cli::handlers::{handle_generate_dataset, handle_launch, handle_serve, handle_simulate, handle_train};

// CLI entry point for EzyMedi
pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();
    let config = load_app_config(args.config.as_deref()).context("Failed to load configuration")?;
    debug!("Loaded configuration: {:?}", config);

    match args.command {
        Commands::Serve(serve) => handle_serve(config, serve).await,
        Commands::Simulate(simulate) => handle_simulate(config, simulate).await,
        Commands::Train(train) => handle_train(config, train).await,
        Commands::GenerateDataset(generate) => handle_generate_dataset(config, generate).await,
        Commands::Launch(launch) => handle_launch(config, launch).await,
    }
}
