// server/src/cli/commands.rs

// This file defines the command-line arguments and subcommands
// for the EzyMedi CLI using the `clap` crate.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ezymedi")]
#[command(version = "0.1.0")]
#[command(about = "EzyMedi clinical decision node")]
pub struct CliArgs {
    /// YAML configuration file (defaults to ./ezymedi.yaml when present)
    #[clap(long, short = 'c', global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the ingest and status API
    Serve(ServeArgs),
    /// Feed the synthetic ward to a running API
    Simulate(SimulateArgs),
    /// Train the anomaly classifier and write the model file
    Train(TrainArgs),
    /// Write an augmented training table as CSV
    GenerateDataset(GenerateDatasetArgs),
    /// Train if needed, then serve with the ward fed in-process
    Launch(LaunchArgs),
}

#[derive(Debug, Args, Default)]
pub struct ServerOverrides {
    #[clap(long)]
    pub host: Option<String>,
    #[clap(long, short = 'p', env = "PORT")]
    pub port: Option<u16>,
    #[clap(long, value_hint = clap::ValueHint::DirPath)]
    pub data_directory: Option<PathBuf>,
    /// `sled` or `inmemory`
    #[clap(long)]
    pub storage_engine_type: Option<String>,
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[clap(flatten)]
    pub server: ServerOverrides,
}

#[derive(Debug, Args, Default)]
pub struct WardOverrides {
    #[clap(long)]
    pub tick_ms: Option<u64>,
    #[clap(long, value_hint = clap::ValueHint::DirPath)]
    pub recordings_directory: Option<PathBuf>,
    #[clap(long)]
    pub seed: Option<u64>,
    /// Stop after this many packets
    #[clap(long)]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Ingest endpoint to post packets to
    #[clap(long)]
    pub url: Option<String>,
    #[clap(flatten)]
    pub ward: WardOverrides,
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    pub csv: Option<PathBuf>,
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    pub model_path: Option<PathBuf>,
    #[clap(long)]
    pub samples: Option<usize>,
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct GenerateDatasetArgs {
    #[clap(long, short = 'o', value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    #[clap(long)]
    pub samples: Option<usize>,
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct LaunchArgs {
    #[clap(flatten)]
    pub server: ServerOverrides,
    #[clap(flatten)]
    pub ward: WardOverrides,
    /// Retrain even when a model file already exists
    #[clap(long)]
    pub retrain: bool,
}
