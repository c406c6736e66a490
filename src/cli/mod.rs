//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// nodepool - node registry with label queries and ownership claims.
#[derive(Parser, Debug)]
#[command(name = "nodepool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the registry.
    Start(commands::StartArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
    /// Inspect or compact a node log.
    Inspect(commands::InspectArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::ConfigCommand;

    #[test]
    fn config_subcommand_reads_global_config_flag() {
        let cli = Cli::try_parse_from(["nodepool", "config", "validate", "-c", "x.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("x.toml"));
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.command, ConfigCommand::Validate)),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli =
            Cli::try_parse_from(["nodepool", "--config", "y.toml", "config", "show", "--format", "json"])
                .unwrap();
        assert_eq!(cli.config.as_deref(), Some("y.toml"));
        match cli.command {
            Commands::Config(args) => match args.command {
                ConfigCommand::Show { format } => assert_eq!(format, "json"),
                other => panic!("unexpected subcommand: {:?}", other),
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn start_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "nodepool", "start", "--backend", "log", "--data-dir", "/tmp/np", "--log-level", "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Start(args) => {
                assert_eq!(args.backend.as_deref(), Some("log"));
                assert_eq!(args.data_dir.as_deref(), Some("/tmp/np"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
