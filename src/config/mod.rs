//! Configuration management for esdump
//!
//! This module handles loading, parsing, and managing configuration from:
//! - Configuration files (TOML format)
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection configuration
    pub connection: ConnectionConfig,

    /// Backup configuration
    pub backup: BackupConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the Elasticsearch cluster
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Backup-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Folder the dump files are written into
    #[serde(default = "default_folder")]
    pub folder: PathBuf,

    /// Scroll page size requested per shard
    #[serde(default = "default_size_per_shard")]
    pub size_per_shard: u32,

    /// Scroll cursor validity window in seconds
    #[serde(default = "default_scroll_ttl")]
    pub scroll_ttl_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_folder() -> PathBuf {
    PathBuf::from("backup")
}

fn default_size_per_shard() -> u32 {
    100
}

fn default_scroll_ttl() -> u64 {
    60
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            size_per_shard: default_size_per_shard(),
            scroll_ttl_secs: default_scroll_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional explicit path.
    ///
    /// An explicit path must exist and parse; without one, the default path
    /// is used when present and defaults are used otherwise.
    ///
    /// # Arguments
    /// * `path` - Explicit config file path, if any
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::from_file(explicit),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".esdump")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.backup.size_per_shard == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backup.size_per_shard".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.backup.scroll_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backup.scroll_ttl_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if !self.connection.url.starts_with("http://") && !self.connection.url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "connection.url".to_string(),
                value: self.connection.url.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Get request timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout)
    }

    /// Get the scroll validity window as Duration
    pub fn scroll_ttl(&self) -> Duration {
        Duration::from_secs(self.backup.scroll_ttl_secs)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.url, "http://localhost:9200");
        assert_eq!(config.backup.size_per_shard, 100);
        assert_eq!(config.backup.scroll_ttl_secs, 60);
        assert_eq!(config.backup.folder, PathBuf::from("backup"));
    }

    #[test]
    fn test_timeouts_as_durations() {
        let config = Config::default();
        assert_eq!(config.connection_timeout(), Duration::from_secs(30));
        assert_eq!(config.scroll_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[connection]
url = "http://es.internal:9200"

[backup]
folder = "/var/backups/es"
size_per_shard = 500
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.connection.url, "http://es.internal:9200");
        assert_eq!(config.backup.folder, PathBuf::from("/var/backups/es"));
        assert_eq!(config.backup.size_per_shard, 500);
        // Unspecified sections fall back to defaults
        assert_eq!(config.backup.scroll_ttl_secs, 60);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/esdump.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.backup.size_per_shard = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.connection.url = "localhost:9200".to_string();
        assert!(config.validate().is_err());
    }
}
