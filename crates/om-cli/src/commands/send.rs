//! Send command implementation

use anyhow::{bail, Result};

use om_console::{discover_with_retry, CommandClient, EventSink};
use om_core::config::ConsoleConfig;
use om_core::PortDiscovery;

use crate::output::print_error;

/// Send one command and print whatever comes back
///
/// Without `--port` the port is discovered once, or with retries when
/// `wait` is set.
pub async fn send_command(
    config: &ConsoleConfig,
    command: &str,
    port: Option<u16>,
    wait: bool,
) -> Result<()> {
    let client = CommandClient::new(config.clone());

    let port = match port {
        Some(port) => Some(port),
        None => {
            let discovery = PortDiscovery::new(config.rendezvous_dir());
            if wait {
                discover_with_retry(
                    client.state(),
                    &discovery,
                    &config.discovery,
                    &EventSink::disabled(),
                )
                .await
            } else {
                discovery.discover().await
            }
        }
    };

    let Some(port) = port else {
        print_error("Is openMSX running? Try: omsx launch");
        bail!("No openMSX command port found");
    };
    client.set_port(port);

    let result = client.send(command).await;
    client.close().await;

    match result {
        Ok(response) => {
            println!("{}", response.to_string().trim_end());
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Failed to send {:?}: {}", command, e));
            Err(e.into())
        }
    }
}
