//! CLI command implementations

mod catalog;
mod config;
mod console;
mod discover;
mod launch;
mod send;
mod socket;
mod watch;

pub use catalog::{extensions_command, machines_command};
pub use config::config_show;
pub use console::console_command;
pub use discover::discover_command;
pub use launch::{launch_command, LaunchOptions};
pub use send::send_command;
pub use socket::socket_command;
pub use watch::watch_command;
