use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::model::config::AppConfig;

const APP_DIR: &str = "passdeck";

/// Error type for config file operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// `<config_dir>/passdeck/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("config.toml")
}

/// `<data_dir>/passdeck/vault.json`, or the temp dir when the platform has
/// no data dir.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("vault.json")
}

/// Store path from the config, falling back to [`default_store_path`].
pub fn store_path(config: &AppConfig) -> PathBuf {
    config.store.path.clone().unwrap_or_else(default_store_path)
}

/// Read and parse the config file.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Config for this run. A missing file gives the defaults; so does a file
/// that cannot be read or parsed, after a warning.
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return AppConfig::default();
    }
    match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring config file");
            AppConfig::default()
        }
    }
}

/// Write `config` to `path`, creating parent directories.
pub fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
