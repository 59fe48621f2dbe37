// SPDX-License-Identifier: GPL-3.0-only

//! Persistent configuration
//!
//! Stored as JSON at `<config dir>/filmcam/config.json`. A missing file means
//! defaults; a file that does not parse is an error rather than being
//! silently replaced.

use crate::backends::camera::types::FacingMode;
use crate::constants::{capture, upload};
use crate::pipelines::photo::capture::CaptureBox;
use crate::pipelines::photo::upload::RetryPolicy;
use crate::records::PrivacySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Application directory name under the platform config and data dirs
pub const APP_DIR: &str = "filmcam";

/// Current schema version written to disk
pub const CONFIG_VERSION: u32 = 1;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version
    pub version: u32,
    /// Maximum width of a captured photo
    pub max_width: u32,
    /// Maximum height of a captured photo
    pub max_height: u32,
    /// Camera used when none is requested
    pub facing: FacingMode,
    /// Upload attempts including the first
    pub upload_attempts: u32,
    /// Wait between upload attempts in milliseconds
    pub upload_backoff_ms: u64,
    /// Directory holding uploaded photos
    pub storage_root: PathBuf,
    /// JSON file holding photo records
    pub records_file: PathBuf,
    /// Local user's privacy preferences, `None` if never set
    pub privacy: Option<PrivacySettings>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            version: CONFIG_VERSION,
            max_width: capture::MAX_WIDTH,
            max_height: capture::MAX_HEIGHT,
            facing: FacingMode::default(),
            upload_attempts: upload::MAX_ATTEMPTS,
            upload_backoff_ms: upload::BACKOFF.as_millis() as u64,
            storage_root: data_dir.join("photos"),
            records_file: data_dir.join("records.json"),
            privacy: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, falling back to defaults if the file is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), version = config.version, "Config loaded");
        Ok(config)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// Write to `path`, stamping the current schema version
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let mut config = self.clone();
        config.version = CONFIG_VERSION;
        let json = serde_json::to_string_pretty(&config)?;

        let write = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write)?;
        }
        std::fs::write(path, json).map_err(write)?;

        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn capture_box(&self) -> CaptureBox {
        CaptureBox {
            max_width: self.max_width.max(1),
            max_height: self.max_height.max(1),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.upload_attempts,
            Duration::from_millis(self.upload_backoff_ms),
        )
    }

    /// Privacy preferences with the private/off fallback applied
    pub fn privacy_or_default(&self) -> PrivacySettings {
        self.privacy.clone().unwrap_or_default()
    }
}
