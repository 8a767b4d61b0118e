//! Configuration management for Dripfeed
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`$DRIPFEED_CONFIG`, else
//!    `<config_dir>/dripfeed/config.toml` when it exists)
//! 3. command-line flags and their `DRIPFEED_*` environment variables,
//!    applied by the binaries
//!
//! ```toml
//! [paths]
//! pool = "data/posts.txt"
//! history = "data/posted.log"
//!
//! [history]
//! backend = "file"        # or "sqlite"
//!
//! [posting]
//! max_length = 280
//! max_attempts = 3
//! backoff_base = "5s"
//! jitter = false
//!
//! [sink]
//! command = "post-status"
//! args = ["--account", "main"]
//! timeout = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::history::HistoryBackend;
use crate::publisher::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::text::DEFAULT_MAX_LENGTH;

pub const CONFIG_ENV: &str = "DRIPFEED_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub history: HistoryConfig,
    pub posting: PostingConfig,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub pool: String,
    pub history: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pool: "data/posts.txt".to_string(),
            history: "data/posted.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub backend: HistoryBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    pub max_length: usize,
    pub max_attempts: u32,
    #[serde(with = "duration_str")]
    pub backoff_base: Duration,
    pub jitter: bool,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BASE_DELAY,
            jitter: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Program run once per publish attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub args: Vec<String>,
    #[serde(with = "duration_str")]
    pub timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file at the default location yields the built-in defaults;
    /// a missing file named by `$DRIPFEED_CONFIG` is an error.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from_path(Path::new(&expand(&path)));
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check values that parse fine but cannot work
    pub fn validate(&self) -> Result<()> {
        if self.posting.max_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "posting.max_length".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.posting.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "posting.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.paths.pool.trim().is_empty() {
            return Err(ConfigError::MissingField("paths.pool".to_string()).into());
        }
        if self.paths.history.trim().is_empty() {
            return Err(ConfigError::MissingField("paths.history".to_string()).into());
        }
        Ok(())
    }

    /// Candidate pool location with `~` expanded
    pub fn pool_path(&self) -> PathBuf {
        PathBuf::from(expand(&self.paths.pool))
    }

    /// Posted history location with `~` expanded
    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(expand(&self.paths.history))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.posting.max_attempts,
            base_delay: self.posting.backoff_base,
            jitter: self.posting.jitter,
        }
    }
}

/// `<config_dir>/dripfeed/config.toml`, following XDG conventions
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dripfeed").join("config.toml"))
}

fn expand(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}

/// Serde adapter for durations written like `"5s"` or `"1m 30s"`
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
