//! Core error types for omsx

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the command console
///
/// A discovery miss or an empty response are not errors and never appear
/// here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// No port has been discovered yet
    #[error("Not connected: port unknown")]
    NotConnected,

    /// Connecting to the discovered port failed or timed out
    #[error("Connect to {addr} failed: {reason}")]
    ConnectFailed { addr: String, reason: String },

    /// Read or write on an established connection failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The client has been closed
    #[error("Client closed")]
    Closed,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors while preparing or starting the emulator
#[derive(Error, Debug)]
pub enum LaunchError {
    /// No openMSX directory configured
    #[error("openMSX directory not configured")]
    DirectoryNotConfigured,

    /// Executable missing at the resolved location
    #[error("openMSX executable not found at: {0}")]
    ExecutableNotFound(PathBuf),

    /// No machine selected
    #[error("No MSX machine selected")]
    NoMachine,

    /// Spawning the process failed
    #[error("Failed to execute openMSX: {0}")]
    Spawn(#[source] std::io::Error),

    /// Process exited right after start
    #[error("openMSX exited immediately ({status})\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    ExitedImmediately {
        status: String,
        stdout: String,
        stderr: String,
    },
}
