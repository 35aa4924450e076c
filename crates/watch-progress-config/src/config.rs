use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retention and throttling policy for the watch-progress store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Storage key holding the whole serialized history
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Reports below this percentage are not persisted
    #[serde(default = "default_low_watermark")]
    pub low_watermark: f64,

    /// Reports above this percentage count as finished and drop the entry
    #[serde(default = "default_high_watermark")]
    pub high_watermark: f64,

    #[serde(default = "default_throttle_interval_secs")]
    pub throttle_interval_secs: u64,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Longest throttle window accepted from a config file, one day.
pub const MAX_THROTTLE_INTERVAL_SECS: u64 = 86_400;

fn default_storage_key() -> String {
    "watchHistory".to_string()
}

fn default_max_entries() -> usize {
    50
}

fn default_low_watermark() -> f64 {
    5.0
}

fn default_high_watermark() -> f64 {
    95.0
}

fn default_throttle_interval_secs() -> u64 {
    5
}

fn default_recent_limit() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stderr().is_terminal()
}

pub fn default_store_config() -> StoreConfig {
    StoreConfig {
        storage_key: default_storage_key(),
        max_entries: default_max_entries(),
        low_watermark: default_low_watermark(),
        high_watermark: default_high_watermark(),
        throttle_interval_secs: default_throttle_interval_secs(),
        recent_limit: default_recent_limit(),
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        default_store_config()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if present, otherwise fall back to defaults.
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let store = &self.store;

        if store.storage_key.trim().is_empty() {
            return Err(anyhow::anyhow!("storage_key cannot be empty"));
        }

        if store.max_entries == 0 {
            return Err(anyhow::anyhow!("max_entries must be greater than zero"));
        }

        if !(0.0..=100.0).contains(&store.low_watermark) {
            return Err(anyhow::anyhow!("low_watermark must be between 0 and 100"));
        }

        if !(0.0..=100.0).contains(&store.high_watermark) {
            return Err(anyhow::anyhow!("high_watermark must be between 0 and 100"));
        }

        if store.throttle_interval_secs > MAX_THROTTLE_INTERVAL_SECS {
            return Err(anyhow::anyhow!(
                "throttle_interval_secs ({}) must not exceed {}",
                store.throttle_interval_secs,
                MAX_THROTTLE_INTERVAL_SECS
            ));
        }

        if store.low_watermark >= store.high_watermark {
            return Err(anyhow::anyhow!(
                "low_watermark ({}) must be below high_watermark ({})",
                store.low_watermark,
                store.high_watermark
            ));
        }

        Ok(())
    }
}
