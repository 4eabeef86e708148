pub mod catalog;
pub mod clear;
pub mod config;
pub mod render;
pub mod titles;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use metadata_config::{PathManager, Settings};
use metadata_core::MetadataService;
use std::path::PathBuf;

/// Settings and paths shared by every command.
pub struct Context {
    pub settings: Settings,
    pub paths: PathManager,
    pub config_file: PathBuf,
}

impl Context {
    /// Loads `config_file` (or the platform default). A missing file means defaults.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = config_file.unwrap_or_else(|| paths.config_file());
        let settings = Settings::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

        Ok(Self {
            settings,
            paths,
            config_file,
        })
    }

    /// Builds the service, rejecting settings that cannot work.
    pub fn service(&self) -> Result<MetadataService> {
        self.settings
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", self.config_file.display(), e))?;
        Ok(MetadataService::from_settings(&self.settings, &self.paths))
    }
}
