//! Repository configuration, read from `.gitlet/config.toml`.
//!
//! ```toml
//! [log]
//! filter = "gitlet=debug"
//!
//! [display]
//! abbrev = 12
//! show_untracked = false
//! ```
//!
//! A missing file or missing keys fall back to the defaults.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable that overrides `log.filter`.
pub const LOG_ENV: &str = "GITLET_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `GITLET_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of digest characters shown by `log`, `global-log` and `find`.
    pub abbrev: usize,
    pub show_untracked: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            abbrev: super::DIGEST_LEN,
            show_untracked: true,
        }
    }
}

impl Config {
    /// Load the config from a `.gitlet` directory.
    pub fn load(gitlet_dir: &Path) -> Result<Self, ConfigError> {
        let path = gitlet_dir.join(CONFIG_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path,
            message: err.to_string(),
        })
    }

    /// Write this config into a `.gitlet` directory.
    pub fn save(&self, gitlet_dir: &Path) -> Result<(), ConfigError> {
        let path = gitlet_dir.join(CONFIG_FILE);
        let contents = toml::to_string_pretty(self).map_err(|err| ConfigError::Parse {
            path: path.clone(),
            message: err.to_string(),
        })?;
        fs::write(&path, contents).map_err(|source| ConfigError::Write { path, source })
    }

    /// Digest display length, clamped to something still recognisable.
    pub fn abbrev(&self) -> usize {
        self.display.abbrev.clamp(4, super::DIGEST_LEN)
    }
}
