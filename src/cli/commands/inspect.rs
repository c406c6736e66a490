//! Inspect command implementation.

use crate::registry::NodeStore;
use crate::storage::log::{read_log, LogKv};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// Inspect or compact a node log.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(subcommand)]
    pub command: InspectCommand,
}

/// Inspect subcommands.
#[derive(Subcommand, Debug)]
pub enum InspectCommand {
    /// Print stored nodes as JSON.
    Nodes {
        /// Data directory.
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,
        /// Only nodes owned by this org.
        #[arg(long, conflicts_with = "pool")]
        org: Option<String>,
        /// Only unclaimed nodes.
        #[arg(long)]
        pool: bool,
    },
    /// Print log statistics.
    Stats {
        /// Data directory.
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Rewrite the log keeping only live keys.
    Compact {
        /// Data directory.
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,
    },
}

/// Run the inspect command.
pub fn run_inspect(args: InspectArgs) -> Result<()> {
    match args.command {
        InspectCommand::Nodes {
            data_dir,
            org,
            pool,
        } => {
            let (kv, _) = read_log(&data_dir)
                .with_context(|| format!("failed to read node log in {:?}", data_dir))?;
            let store = NodeStore::new(Arc::new(kv));
            let nodes = match (org, pool) {
                (Some(org), _) => store.list_org_owned(&org)?,
                (None, true) => store.list_pool()?,
                (None, false) => store.list_all()?,
            };
            println!("{}", serde_json::to_string_pretty(&nodes)?);
        }
        InspectCommand::Stats { data_dir } => {
            let (kv, replay) = read_log(&data_dir)
                .with_context(|| format!("failed to read node log in {:?}", data_dir))?;
            let stats = kv.stats();
            println!("Node log: {:?}", data_dir);
            println!("  entries replayed:  {}", replay.applied);
            println!("  unreadable tail:   {} bytes", replay.truncated_bytes);
            println!("  live keys:         {}", stats.live_key_count);
            println!("  value bytes:       {}", stats.value_bytes);
        }
        InspectCommand::Compact { data_dir } => {
            let log = LogKv::open(&data_dir, true)
                .with_context(|| format!("failed to open node log in {:?}", data_dir))?;
            let before = std::fs::metadata(log.path())?.len();
            let frames = log.compact()?;
            let after = std::fs::metadata(log.path())?.len();
            println!(
                "✓ Compacted {:?}: {} live keys, {} -> {} bytes",
                data_dir, frames, before, after
            );
        }
    }
    Ok(())
}
