// server/src/cli/mod.rs

// This file declares the modules within the 'cli' directory and re-exports
// the entry point used by main.rs.

pub mod cli;
pub mod commands;
pub mod handlers;

pub use cli::start_cli;
pub use commands::{CliArgs, Commands};
