//! Configuration management for omsx

mod console;
mod launcher;
pub mod serde_utils;
mod watcher;

pub use console::{BackoffConfig, ConsoleConfig, DiscoveryRetryConfig};
pub use launcher::LauncherConfig;
pub use watcher::WatcherConfig;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Range checks run on every configuration loaded from disk
pub trait Validate {
    /// Reject values the console loops cannot run with
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Reject a zero duration for `field`
pub(crate) fn require_non_zero(field: &str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::Invalid(format!("{} must be greater than 0", field)));
    }
    Ok(())
}

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("omsx")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Whole configuration file, one section per component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// `[console]` section
    pub console: ConsoleConfig,
    /// `[watcher]` section
    pub watcher: WatcherConfig,
    /// `[launcher]` section
    pub launcher: LauncherConfig,
}

impl Validate for ConfigFile {
    fn validate(&self) -> Result<(), ConfigError> {
        self.console.validate()?;
        self.watcher.validate()
    }
}

/// Load and validate configuration from a file
pub fn load_config<T>(path: &Path) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Validate,
{
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the config file, falling back to defaults when the default file is absent
///
/// An explicitly requested path must exist; the default path is optional.
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                load_config(&default_path)
            } else {
                tracing::debug!("No config at {:?}, using defaults", default_path);
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Render a configuration as TOML
pub fn to_toml<T: serde::Serialize>(config: &T) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load_config::<ConfigFile>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[console]\nquiet_period = 600\n\n[launcher]\nmachine = \"Panasonic_FS-A1GT\"\n",
        )
        .unwrap();

        let config: ConfigFile = load_config(&path).unwrap();
        assert_eq!(config.console.quiet_period, Duration::from_millis(600));
        assert_eq!(config.console.hard_deadline, Duration::from_secs(3));
        assert_eq!(config.watcher.interval, Duration::from_secs(2));
        assert_eq!(config.launcher.machine.as_deref(), Some("Panasonic_FS-A1GT"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[console\nquiet_period = ").unwrap();
        let err = load_config::<ConfigFile>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(load_or_default(Some(&path)).is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigFile::default().validate().is_ok());
    }

    #[test]
    fn test_zero_watcher_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[watcher]\ninterval = 0\n").unwrap();

        let err = load_config::<ConfigFile>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("watcher.interval")));
    }

    #[test]
    fn test_quiet_period_must_be_below_hard_deadline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[console]\nquiet_period = 3000\nhard_deadline = 3000\n").unwrap();

        let err = load_config::<ConfigFile>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("quiet_period")));
    }

    #[test]
    fn test_backoff_factors_are_checked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[console.discovery.backoff]\njitter = 1.5\n").unwrap();
        assert!(matches!(
            load_config::<ConfigFile>(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "[console.discovery.backoff]\nmultiplier = inf\n").unwrap();
        assert!(matches!(
            load_config::<ConfigFile>(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "[console.discovery.backoff]\njitter = nan\n").unwrap();
        assert!(matches!(
            load_config::<ConfigFile>(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_default_config_renders() {
        let rendered = to_toml(&ConfigFile::default()).unwrap();
        assert!(rendered.contains("[console]"));
        assert!(rendered.contains("quiet_period = 250"));
    }
}
