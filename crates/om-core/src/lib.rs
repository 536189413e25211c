//! om-core: Core abstractions and configuration for omsx
//!
//! This crate provides the shared types, configuration structures and the
//! rendezvous-file discovery used by the console client and the CLI.

pub mod config;
pub mod discovery;
pub mod error;
pub mod launch;
pub mod socket;
pub mod text;
pub mod types;

pub use discovery::{default_rendezvous_dir, parse_port, PortDiscovery};
pub use error::{ConfigError, ConsoleError, LaunchError};
pub use types::{ConnectionState, LivenessState};
