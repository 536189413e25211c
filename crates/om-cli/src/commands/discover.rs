//! Discover command implementation

use anyhow::{bail, Result};

use om_core::config::ConsoleConfig;
use om_core::PortDiscovery;

use crate::output::print_info;

/// Print the port advertised in the rendezvous directory
pub fn discover_command(config: &ConsoleConfig) -> Result<()> {
    let discovery = PortDiscovery::new(config.rendezvous_dir());
    tracing::debug!("Looking for a port file in {}", discovery.dir().display());

    match discovery.discover_port() {
        Some(port) => {
            println!("{}", port);
            Ok(())
        }
        None => {
            print_info("Is openMSX running? Try: omsx launch");
            bail!(
                "No openMSX port file found in {}",
                discovery.dir().display()
            )
        }
    }
}
