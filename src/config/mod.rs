//! Configuration module
//!
//! Handles sensor type and output selection

mod settings;

pub use settings::{ConfigError, ProsenseConfig, SensorSelection};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "prosense.toml";

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "prosense", "Prosense")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Create the configuration directory
pub fn init_directories() -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}
