//! Command console configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_millis;
use super::{require_non_zero, Validate};
use crate::error::ConfigError;

/// Configuration for the TCP command client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Directory holding the emulator's rendezvous files.
    ///
    /// Defaults to `<temp>/openmsx-default` when unset.
    pub rendezvous_dir: Option<PathBuf>,

    /// Bound on a single connect attempt
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,

    /// Bound on writing one command
    #[serde(with = "duration_millis")]
    pub write_timeout: Duration,

    /// Idle gap after which a response is considered complete
    #[serde(with = "duration_millis")]
    pub quiet_period: Duration,

    /// Upper bound on draining one response, measured from its start
    #[serde(with = "duration_millis")]
    pub hard_deadline: Duration,

    /// Size of each socket read
    pub read_chunk_size: usize,

    /// Startup discovery retry policy
    pub discovery: DiscoveryRetryConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            rendezvous_dir: None,
            connect_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(3),
            quiet_period: Duration::from_millis(250),
            hard_deadline: Duration::from_secs(3),
            read_chunk_size: 4096,
            discovery: DiscoveryRetryConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Rendezvous directory, resolving the default when unset
    pub fn rendezvous_dir(&self) -> PathBuf {
        self.rendezvous_dir
            .clone()
            .unwrap_or_else(crate::discovery::default_rendezvous_dir)
    }
}

/// How often, and for how long, startup discovery retries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryRetryConfig {
    /// Number of discovery attempts before giving up
    pub max_attempts: u32,

    /// Delay between attempts
    pub backoff: BackoffConfig,
}

impl Default for DiscoveryRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Exponential backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Initial delay
    #[serde(with = "duration_millis")]
    pub initial: Duration,

    /// Maximum delay
    #[serde(with = "duration_millis")]
    pub max: Duration,

    /// Multiplier for each retry
    pub multiplier: f64,

    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(4),
            multiplier: 1.5,
            jitter: 0.1,
        }
    }
}

impl Validate for ConsoleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_non_zero("console.connect_timeout", self.connect_timeout)?;
        require_non_zero("console.write_timeout", self.write_timeout)?;
        require_non_zero("console.quiet_period", self.quiet_period)?;
        require_non_zero("console.hard_deadline", self.hard_deadline)?;
        if self.quiet_period >= self.hard_deadline {
            return Err(ConfigError::Invalid(format!(
                "console.quiet_period ({:?}) must be shorter than console.hard_deadline ({:?})",
                self.quiet_period, self.hard_deadline
            )));
        }
        if self.read_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "console.read_chunk_size must be greater than 0".to_string(),
            ));
        }
        self.discovery.backoff.validate()
    }
}

impl Validate for BackoffConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "console.discovery.backoff.multiplier must be a finite number >= 1, got {}",
                self.multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::Invalid(format!(
                "console.discovery.backoff.jitter must be between 0 and 1, got {}",
                self.jitter
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_console_timings() {
        let config = ConsoleConfig::default();
        assert_eq!(config.quiet_period, Duration::from_millis(250));
        assert_eq!(config.hard_deadline, Duration::from_secs(3));
        assert!(config.quiet_period < config.hard_deadline);
        assert_eq!(config.discovery.max_attempts, 12);
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let config = ConsoleConfig {
            connect_timeout: Duration::ZERO,
            ..ConsoleConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_nan_jitter_is_rejected() {
        let backoff = BackoffConfig {
            jitter: f64::NAN,
            ..BackoffConfig::default()
        };
        assert!(backoff.validate().is_err());
    }

    #[test]
    fn test_rendezvous_dir_override() {
        let mut config = ConsoleConfig::default();
        assert!(config.rendezvous_dir().ends_with("openmsx-default"));

        config.rendezvous_dir = Some(PathBuf::from("/tmp/custom"));
        assert_eq!(config.rendezvous_dir(), PathBuf::from("/tmp/custom"));
    }
}
