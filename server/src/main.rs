// server/src/main.rs

// This is the main entry point for the EzyMedi node.
// It handles command-line argument parsing and dispatches to the CLI logic.

use anyhow::Result;
use ezymedi_server::cli::start_cli;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    start_cli().await
}
