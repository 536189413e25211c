//! Interactive console
//!
//! Runs startup discovery, the liveness watcher and an event printer next
//! to a stdin loop. Every input line is sent as one command; responses and
//! failures come back through the event channel.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use om_console::events::{self, ConsoleEvent};
use om_console::{spawn_discovery, CommandClient, LivenessWatcher};
use om_core::config::ConfigFile;
use om_core::{ConsoleError, PortDiscovery};

use crate::output::{print_info, print_warning, render_event};

/// Lines that end the session instead of being sent
const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// Run the interactive console until EOF, `exit` or Ctrl-C
///
/// Ctrl-C also interrupts a command still waiting for its response.
pub async fn console_command(config: &ConfigFile, port: Option<u16>) -> Result<()> {
    let (sink, mut rx) = events::channel();
    let client = Arc::new(CommandClient::new(config.console.clone()).with_events(sink.clone()));
    let rendezvous = config.console.rendezvous_dir();

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render_event(&event);
        }
    });

    let discovery = match port {
        Some(port) => {
            client.set_port(port);
            sink.emit(ConsoleEvent::Status(format!("Using port {}", port)));
            None
        }
        None => Some(spawn_discovery(
            client.clone(),
            PortDiscovery::new(rendezvous.clone()),
        )),
    };

    let cancel = CancellationToken::new();
    let mut watcher = LivenessWatcher::new(PortDiscovery::new(rendezvous), config.watcher.clone())
        .with_events(sink);
    if let Some(port) = port {
        watcher = watcher.with_port(port);
    }
    let (watcher_handle, _liveness) = watcher.spawn(cancel.clone());

    print_info("Type openMSX commands; 'exit' or Ctrl-D to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&command) {
            break;
        }

        // responses and transport failures are rendered by the printer
        let sent = tokio::select! {
            sent = client.send(command) => sent,
            _ = tokio::signal::ctrl_c() => break,
        };
        if let Err(ConsoleError::NotConnected) = sent {
            print_warning("No openMSX port known yet");
        }
    }

    client.close().await;
    cancel.cancel();
    if let Err(e) = watcher_handle.await {
        tracing::error!("Liveness watcher task failed: {}", e);
    }
    if let Some(discovery) = discovery {
        if let Err(e) = discovery.await {
            tracing::error!("Discovery task failed: {}", e);
        }
    }

    // every sender is gone once the tasks above finish
    drop(client);
    let _ = printer.await;

    Ok(())
}
