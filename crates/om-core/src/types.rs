//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection status of a command client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No live connection
    #[default]
    Disconnected,
    /// A connect attempt is in flight
    Connecting,
    /// Connected and ready to send
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Result of one liveness probe
///
/// Recomputed from scratch on every watcher tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LivenessState {
    /// Port advertised by the newest rendezvous file, if any
    pub port: Option<u16>,
    /// Whether a TCP connect to that port succeeded
    pub reachable: bool,
}

impl LivenessState {
    /// State for a tick where no port was discovered
    pub fn unknown() -> Self {
        Self {
            port: None,
            reachable: false,
        }
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.port, self.reachable) {
            (Some(port), true) => write!(f, "reachable on port {}", port),
            (Some(port), false) => write!(f, "not reachable (port {})", port),
            (None, _) => write!(f, "not reachable (no port file)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(format!("{}", ConnectionState::Connected), "connected");
        assert_eq!(
            format!("{}", ConnectionState::Disconnected),
            "disconnected"
        );
    }

    #[test]
    fn test_connection_state_defaults_to_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_liveness_display() {
        let up = LivenessState {
            port: Some(9938),
            reachable: true,
        };
        assert_eq!(up.to_string(), "reachable on port 9938");
        assert!(LivenessState::unknown().to_string().contains("no port file"));
    }
}
