pub mod config;
pub mod paths;

pub use config::{Config, LoggingConfig, StoreConfig, default_store_config, MAX_THROTTLE_INTERVAL_SECS};
pub use paths::{PathManager, container_base_path};
