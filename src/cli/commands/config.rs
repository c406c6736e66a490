//! Config command implementation.

use crate::core::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/nodepool.toml";

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate configuration file.
    Validate,
    /// Print configuration with defaults filled in.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Run the config command against the global `--config` path.
pub fn run_config(config_path: Option<&Path>, args: ConfigArgs) -> Result<()> {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    match args.command {
        ConfigCommand::Validate => validate_config(path),
        ConfigCommand::Show { format } => show_config(path, &format),
    }
}

fn validate_config(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {:?}", path);
    }

    let config = Config::from_file(path)?;
    println!("✓ Configuration is valid");
    println!("  storage.backend = {}", config.storage.backend);
    if config.is_durable() {
        println!("  storage.data_dir = {}", config.storage.data_dir);
    }
    println!("  authorization.mode = {}", config.authorization.mode);
    if config.authorization.mode == "permissive" {
        println!("  ⚠ Warning: every caller is authorized (permissive mode)");
    }
    Ok(())
}

fn show_config(path: &Path, format: &str) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {:?}", path);
    }

    let config = Config::from_file(path)?;
    println!("{}", render_config(&config, format)?);
    Ok(())
}

fn render_config(config: &Config, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(config)?),
        "toml" => Ok(toml::to_string_pretty(config)?),
        other => anyhow::bail!("unknown format {:?}, expected toml or json", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_defaults() {
        let config = Config::from_toml("[storage]\nbackend = \"log\"\n").unwrap();

        let toml = render_config(&config, "toml").unwrap();
        assert!(toml.contains("backend = \"log\""));
        assert!(toml.contains("channel_capacity = 128"));

        let json = render_config(&config, "json").unwrap();
        assert!(json.contains("\"mode\": \"permissive\""));

        assert!(render_config(&config, "yaml").is_err());
    }
}
