pub mod clear;
pub mod config;
pub mod history;
pub mod record;

use crate::output::{Output, OutputFormat};
use color_eyre::eyre::Context as _;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::debug;
use watch_progress_config::{Config, PathManager};
use watch_progress_core::{FileStorage, ProgressStore, StoreSettings};

/// Everything a command needs: resolved paths, loaded config and output.
pub struct Context {
    pub paths: PathManager,
    pub config: Config,
    pub storage_dir: PathBuf,
    pub output: Output,
}

impl Context {
    pub fn load(storage_dir: Option<PathBuf>, format: OutputFormat, quiet: bool) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

        let storage_dir = storage_dir.unwrap_or_else(|| paths.storage_dir());

        Ok(Self {
            paths,
            config,
            storage_dir,
            output: Output::new(format, quiet),
        })
    }

    pub fn open_store(&self) -> Result<ProgressStore<FileStorage>> {
        let storage = FileStorage::new(&self.storage_dir)
            .wrap_err_with(|| format!("Failed to open storage at {}", self.storage_dir.display()))?;
        debug!("Opened watch history storage at {}", self.storage_dir.display());
        Ok(ProgressStore::new(storage, StoreSettings::from(&self.config.store)))
    }
}
