//! Configuration loading for marketview.
//!
//! The configuration is stored in TOML format and defines:
//! - Where the catalog and installed registry are read from
//! - Fetch and refetch timeouts, notification buffering
//! - The default page size of queries
//!
//! Every key is optional.

use crate::marketplace::query::{DEFAULT_PAGE_SIZE, QueryParams};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the configuration file looked up in the working directory and the
/// user config directory.
pub const CONFIG_FILE_NAME: &str = "marketview.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Input files for the file-backed catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// JSON array of marketplace apps.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// TOML registry of installed apps. May be absent.
    #[serde(default = "default_installed_path")]
    pub installed_path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.json")
}

fn default_installed_path() -> PathBuf {
    PathBuf::from("installed.toml")
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            installed_path: default_installed_path(),
        }
    }
}

/// Synchronisation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Limit for each initial fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Limit for each per-app refetch call, in seconds.
    #[serde(default = "default_refetch_timeout_secs")]
    pub refetch_timeout_secs: u64,

    /// Notifications buffered per subscription.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

const fn default_fetch_timeout_secs() -> u64 {
    30
}

const fn default_refetch_timeout_secs() -> u64 {
    10
}

const fn default_event_buffer() -> usize {
    marketview_client::hub::DEFAULT_EVENT_BUFFER
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            refetch_timeout_secs: default_refetch_timeout_secs(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl SyncConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn refetch_timeout(&self) -> Duration {
        Duration::from_secs(self.refetch_timeout_secs)
    }
}

/// Query defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE.get()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketviewConfig {
    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

impl MarketviewConfig {
    /// Load configuration from a file.
    ///
    /// Relative source paths are resolved against the directory holding the
    /// file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: MarketviewConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration (pure function).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.fetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sync.fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.sync.refetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sync.refetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.sync.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "sync.event_buffer must be greater than zero".to_string(),
            ));
        }
        if self.query.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "query.page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Make relative source paths relative to `base`.
    pub fn resolve_relative(&mut self, base: &Path) {
        for path in [
            &mut self.sources.catalog_path,
            &mut self.sources.installed_path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Find the configuration file to use: `explicit` if given, then
    /// `./marketview.toml`, then the user config directory.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }

        directories::ProjectDirs::from("", "", "marketview")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.is_file())
    }

    /// Default query parameters for commands.
    pub fn query_params(&self) -> QueryParams {
        let page_size = NonZeroUsize::new(self.query.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
        QueryParams::default().with_page_size(page_size)
    }
}
