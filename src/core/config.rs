//! Configuration - Type-safe, validated config for the tick-order binary
//!
//! The order itself never reads configuration; only `main` does.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{Error, Result};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Order settings
    pub order: OrderConfig,

    /// Tick feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Paper venue settings
    #[serde(default)]
    pub paper: PaperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Buy when a tick trades strictly below this price
    pub price_threshold: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of threads delivering ticks concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// JSON-lines tick file. Stdin when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Reject every buy, to exercise the errored path
    #[serde(default)]
    pub fail_buys: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workers() -> usize {
    4
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            order: OrderConfig {
                price_threshold: Decimal::from(100),
            },
            feed: FeedConfig::default(),
            paper: PaperConfig::default(),
        }
    }
}

impl Config {
    /// Load from TOML file and validate
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    /// A file that exists but is invalid is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let cfg = Self::load(path)?;
            tracing::info!("Loaded config from {}", path.display());
            Ok(cfg)
        } else {
            tracing::warn!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.order.price_threshold <= Decimal::ZERO {
            return Err(Error::Config(format!(
                "order.price_threshold must be greater than zero, got {}",
                self.order.price_threshold
            )));
        }
        if self.feed.workers == 0 {
            return Err(Error::Config("feed.workers must be at least 1".into()));
        }
        Ok(())
    }
}
