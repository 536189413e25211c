//! openMSX command console
//!
//! This crate talks to a running openMSX over its local TCP command port:
//!
//! - [`CommandClient`]: lazily connected command/response client
//! - [`spawn_discovery`]: startup task that finds the port with backoff
//! - [`LivenessWatcher`]: independent reachability loop
//!
//! Background tasks report through [`ConsoleEvent`]s rather than printing.

pub mod backoff;
pub mod client;
pub mod discover;
pub mod drain;
pub mod events;
pub mod state;
pub mod watcher;

pub use client::{normalize_command, CommandClient, Response, NO_RESPONSE};
pub use discover::{discover_with_retry, spawn_discovery};
pub use events::{ConsoleEvent, EventSink};
pub use state::ConsoleState;
pub use watcher::{probe, LivenessWatcher};
