//! Configuration parsing and validation.
//!
//! Configuration is loaded from TOML files with CLI overrides. Every section
//! is optional; an empty file yields an in-memory, permissive registry.

use crate::control::Grant;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Node storage backend.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Registration channel.
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// Embedded authorizer.
    #[serde(default)]
    pub authorization: AuthorizationConfig,

    /// Logging.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend: "memory" or "log".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Directory holding the node log (log backend only).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// fsync after every logged mutation.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            sync_writes: default_sync_writes(),
        }
    }
}

/// Registration channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Bound of the request queue.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Embedded authorizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Mode: "permissive" or "grants".
    #[serde(default = "default_authorization_mode")]
    pub mode: String,

    /// Allowed combinations in grants mode. `*` matches any value.
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            mode: default_authorization_mode(),
            grants: Vec::new(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_backend() -> String {
    "memory".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_sync_writes() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    128
}

fn default_authorization_mode() -> String {
    "permissive".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(ref data_dir) = overrides.data_dir {
            self.storage.data_dir = data_dir.clone();
        }
        if let Some(ref backend) = overrides.backend {
            self.storage.backend = backend.clone();
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_storage()?;
        self.validate_registration()?;
        self.validate_authorization()?;
        self.validate_telemetry()?;
        Ok(())
    }

    /// Whether the log backend is selected.
    pub fn is_durable(&self) -> bool {
        self.storage.backend == "log"
    }

    fn validate_storage(&self) -> Result<()> {
        if self.storage.backend != "memory" && self.storage.backend != "log" {
            anyhow::bail!(
                "storage.backend must be 'memory' or 'log', got: {}",
                self.storage.backend
            );
        }

        if self.is_durable() && self.storage.data_dir.is_empty() {
            anyhow::bail!("storage.data_dir required for the log backend");
        }

        Ok(())
    }

    fn validate_registration(&self) -> Result<()> {
        if self.registration.channel_capacity == 0 {
            anyhow::bail!("registration.channel_capacity must be > 0");
        }
        Ok(())
    }

    fn validate_authorization(&self) -> Result<()> {
        match self.authorization.mode.as_str() {
            "permissive" => {}
            "grants" => {
                if self.authorization.grants.is_empty() {
                    anyhow::bail!("authorization.grants required for grants mode");
                }
            }
            other => anyhow::bail!(
                "authorization.mode must be 'permissive' or 'grants', got: {}",
                other
            ),
        }

        for (i, grant) in self.authorization.grants.iter().enumerate() {
            if grant.subject.is_empty()
                || grant.action.is_empty()
                || grant.resource_kind.is_empty()
                || grant.resource_id.is_empty()
            {
                anyhow::bail!("authorization.grants[{}] has an empty field", i);
            }
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Override storage data directory.
    pub data_dir: Option<String>,
    /// Override storage backend.
    pub backend: Option<String>,
}
