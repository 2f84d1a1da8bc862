//! Configuration management for the ledger host

use crate::error::ChainError;
use crate::ledger::PolicyKind;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// File read by [`load_config`] from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ledger.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Processing order for each epoch
    #[serde(default)]
    pub policy: PolicyKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ChainError> {
        tracing::Level::from_str(&self.level).map_err(|_| {
            ChainError::ConfigError(format!(
                "logging.level must be one of trace, debug, info, warn, error (got '{}')",
                self.level
            ))
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads `ledger.toml` from the working directory, falling back to defaults when absent.
pub fn load_config() -> Result<Config, ChainError> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        load_config_from(path)
    } else {
        Ok(Config::default())
    }
}

pub fn load_config_from(path: &Path) -> Result<Config, ChainError> {
    let config_str = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_str)?;

    // Validate critical values
    config.logging.max_level()?;

    Ok(config)
}
