//! Configuration file handling.
//!
//! This module provides loading and saving of dnsposture configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/dnsposture/config.toml`
//! - macOS: `~/Library/Application Support/dnsposture/config.toml`
//! - Windows: `%APPDATA%\dnsposture\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! nameserver = "127.0.0.1"
//! default_format = "table"
//! parallel = false
//! probe_timeout_secs = 0
//!
//! [resolver]
//! port = 53
//! timeout_secs = 3
//! lifetime_secs = 6
//! attempts = 2
//! zone_transfer_timeout_secs = 5
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::DEFAULT_NAMESERVER;
use crate::resolver::ResolverSettings;
use crate::scan::ScanOptions;

/// Application configuration.
///
/// Every field has a default, so a partial file is valid.
///
/// # Example
///
/// ```no_run
/// use dnsposture::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Nameserver: {}", config.nameserver);
/// println!("Query timeout: {}s", config.resolver.timeout_secs);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nameserver queried when no `--nameserver` flag is provided.
    ///
    /// Default: "127.0.0.1"
    pub nameserver: String,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Whether to run probes concurrently.
    ///
    /// Default: false
    pub parallel: bool,

    /// Per-probe deadline in seconds. A probe that exceeds it is reported
    /// with status `error`. 0 means no deadline.
    ///
    /// Default: 0
    pub probe_timeout_secs: u64,

    /// Resolver timeouts and transport.
    pub resolver: ResolverSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nameserver: DEFAULT_NAMESERVER.to_string(),
            default_format: "table".to_string(),
            parallel: false,
            probe_timeout_secs: 0,
            resolver: ResolverSettings::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`, falling back to defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use dnsposture::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("dnsposture/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dnsposture")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        match self.probe_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            parallel: self.parallel,
            probe_timeout: self.probe_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.nameserver, "127.0.0.1");
        assert_eq!(config.default_format, "table");
        assert!(!config.parallel);
        assert_eq!(config.probe_timeout(), None);
        assert_eq!(config.resolver.timeout_secs, 3);
        assert_eq!(config.resolver.lifetime_secs, 6);
        assert_eq!(config.resolver.zone_transfer_timeout_secs, 5);
    }

    #[test]
    fn test_probe_timeout_from_config() {
        assert_eq!(Config::default().scan_options().probe_timeout, None);

        let config = Config {
            probe_timeout_secs: 45,
            ..Config::default()
        };
        assert_eq!(config.scan_options().probe_timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            nameserver = "192.0.2.53"

            [resolver]
            timeout_secs = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.nameserver, "192.0.2.53");
        assert_eq!(config.default_format, "table");
        assert_eq!(config.resolver.timeout_secs, 1);
        assert_eq!(config.resolver.lifetime_secs, 6);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            parallel: true,
            default_format: "json".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "parallel = \"sometimes\"").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_generate_default_config_parses() {
        let text = Config::generate_default_config();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
