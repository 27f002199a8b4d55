#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for otaup
//!
//! Configuration is merged from three layers, lowest precedence first:
//! - Default values (hard-coded)
//! - Configuration file (TOML)
//! - Environment variables / CLI flags (applied by the caller)

use serde::{Deserialize, Serialize};
use otaup_errors::{ConfigError, Error};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub mod constants;

/// Update engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the update server, without trailing slash
    #[serde(default)]
    pub base_url: String,

    /// Directory the live and staging trees live under
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Name of the live tree directory
    #[serde(default = "default_live_dir")]
    pub live_dir: String,

    /// Name of the staging tree directory
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Install the remote version regardless of version ordering
    #[serde(default)]
    pub force_update: bool,

    /// Emit per-step log detail
    #[serde(default)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            root: default_root(),
            live_dir: default_live_dir(),
            staging_dir: default_staging_dir(),
            headers: HashMap::new(),
            force_update: false,
            verbose: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_live_dir() -> String {
    constants::DEFAULT_LIVE_DIR.to_string()
}

fn default_staging_dir() -> String {
    constants::DEFAULT_STAGING_DIR.to_string()
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or does
    /// not parse as TOML.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into()
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load from a file when a path is given, otherwise use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a path is given and loading it fails.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(p) => Self::load(p).await,
            None => Ok(Self::default()),
        }
    }

    /// Merge recognized environment variables over the current values
    ///
    /// `OTAUP_BASE_URL` and `OTAUP_ROOT` are recognized.
    pub fn merge_env(&mut self) {
        if let Ok(url) = std::env::var("OTAUP_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(root) = std::env::var("OTAUP_ROOT") {
            self.root = PathBuf::from(root);
        }
    }

    /// Strip trailing separators and check the values make sense
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or the tree names are
    /// empty or identical.
    pub fn validate(&mut self) -> Result<(), Error> {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self.live_dir = self.live_dir.trim_end_matches('/').to_string();
        self.staging_dir = self.staging_dir.trim_end_matches('/').to_string();

        if self.base_url.is_empty() {
            return Err(ConfigError::Invalid {
                message: "base_url is required".to_string(),
            }
            .into());
        }
        if self.live_dir.is_empty() || self.staging_dir.is_empty() {
            return Err(ConfigError::Invalid {
                message: "live_dir and staging_dir must not be empty".to_string(),
            }
            .into());
        }
        if self.live_dir == self.staging_dir {
            return Err(ConfigError::Invalid {
                message: "live_dir and staging_dir must differ".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Path of the live tree
    #[must_use]
    pub fn live_root(&self) -> PathBuf {
        self.root.join(&self.live_dir)
    }

    /// Path of the staging tree
    #[must_use]
    pub fn staging_root(&self) -> PathBuf {
        self.root.join(&self.staging_dir)
    }

    /// Path the downloaded bundle is written to
    #[must_use]
    pub fn bundle_path(&self) -> PathBuf {
        self.root.join(constants::BUNDLE_FILE_NAME)
    }
}
