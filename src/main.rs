//! nodepool - unified CLI entrypoint.
//!
//! Usage:
//!   nodepool start [--config config/nodepool.toml] [--backend log --data-dir data]
//!   nodepool config validate [--config config/nodepool.toml]
//!   nodepool inspect nodes --data-dir data [--org acme | --pool]
//!   nodepool inspect compact --data-dir data

use anyhow::Result;
use clap::Parser;
use nodepool::cli::commands::{run_config, run_inspect, run_start};
use nodepool::cli::{Cli, Commands};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.map(PathBuf::from);

    match cli.command {
        Commands::Start(args) => run_start(config_path.as_deref(), cli.log_level, args).await,
        Commands::Config(args) => run_config(config_path.as_deref(), args),
        Commands::Inspect(args) => run_inspect(args),
    }
}
