pub mod types;

use crate::error::{ConfigError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".resource-aggregator.toml";

/// Get the global config file path (~/.resource-aggregator.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (dir/.resource-aggregator.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Read and parse a single config file.
pub fn load_config_file(path: &Path) -> Result<types::Config> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|e| ConfigError::ParsingFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(config)
}

/// Load configuration from file or use defaults.
///
/// An explicit path must exist and parse. Otherwise the current directory
/// is checked first, then the home directory; files there that fail to
/// load are reported and ignored.
pub fn load_config(explicit: Option<&Path>) -> Result<types::Config> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }

    let local = std::env::current_dir().ok().map(|dir| local_config_path(&dir));
    for candidate in local.into_iter().chain(global_config_path()) {
        if !candidate.exists() {
            continue;
        }
        match load_config_file(&candidate) {
            Ok(config) => {
                debug!("Loaded configuration from {}", candidate.display());
                return Ok(config);
            }
            Err(e) => warn!("Ignoring configuration file: {}", e),
        }
    }

    Ok(types::Config::default())
}
