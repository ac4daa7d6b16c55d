//! User configuration from `config.toml` and the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the database location.
pub const DB_ENV: &str = "NIB_DB";

/// Log filter used when neither `RUST_LOG` nor the config file sets one.
pub const DEFAULT_LOG_FILTER: &str = "nib=warn";

const APP_DIR: &str = "nib";
const DB_FILE: &str = "nib.db";

/// User settings from `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database file.
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// `tracing` filter directive, e.g. `"nib=debug"`.
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Config {
    /// Resolved database path.
    ///
    /// `NIB_DB`, then the `database` key, then the platform data directory
    /// (`~/.local/share/nib/nib.db` on Linux), then `./nib.db`.
    pub fn database_path(&self) -> PathBuf {
        if let Ok(p) = std::env::var(DB_ENV) {
            if !p.is_empty() {
                return PathBuf::from(p);
            }
        }
        if let Some(p) = &self.database {
            return p.clone();
        }
        match dirs::data_local_dir() {
            Some(dir) => dir.join(APP_DIR).join(DB_FILE),
            None => PathBuf::from(DB_FILE),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

/// Location of the config file, e.g. `~/.config/nib/config.toml` on Linux.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Loads the config file, or defaults if there is none.
pub fn load_config() -> Result<Config, ConfigError> {
    match config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
