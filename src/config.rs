use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default database file.
fn default_database() -> PathBuf {
    PathBuf::from("bucketbook.db")
}

/// Default bound on a single bucket fetch (10 seconds).
fn default_fetch_timeout_ms() -> u64 {
    10_000
}

/// Balance aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// How long one account's bucket fetch may take before the whole
    /// aggregation fails.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl AggregationConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file. If relative, resolved from the config file location.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Balance aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            aggregation: AggregationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the database path against the directory holding the config file.
    pub fn resolve_database(&self, config_dir: &Path) -> PathBuf {
        if self.database.is_absolute() {
            self.database.clone()
        } else {
            config_dir.join(&self.database)
        }
    }
}
