//! Liveness watcher configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;
use super::{require_non_zero, Validate};
use crate::error::ConfigError;

/// Configuration for the liveness watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Time between ticks
    #[serde(with = "duration_millis")]
    pub interval: Duration,

    /// Bound on the throwaway reachability connect
    #[serde(with = "duration_millis")]
    pub probe_timeout: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            probe_timeout: Duration::from_millis(500),
        }
    }
}

impl Validate for WatcherConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_non_zero("watcher.interval", self.interval)?;
        require_non_zero("watcher.probe_timeout", self.probe_timeout)
    }
}
