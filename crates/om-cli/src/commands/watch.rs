//! Watch command implementation

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use om_console::LivenessWatcher;
use om_core::config::ConfigFile;
use om_core::{LivenessState, PortDiscovery};

use crate::output::print_liveness;

fn render(state: &LivenessState, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string(state).context("Failed to encode liveness state")?
        );
    } else {
        print_liveness(state);
    }
    Ok(())
}

/// Print liveness on every watcher tick until Ctrl-C
pub async fn watch_command(config: &ConfigFile, once: bool, json: bool) -> Result<()> {
    let discovery = PortDiscovery::new(config.console.rendezvous_dir());
    let watcher = LivenessWatcher::new(discovery, config.watcher.clone());

    if once {
        return render(&watcher.tick().await, json);
    }

    let cancel = CancellationToken::new();
    let (handle, mut rx) = watcher.spawn(cancel.clone());

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *rx.borrow_and_update();
                render(&state, json)?;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    cancel.cancel();
    let _ = handle.await;
    Ok(())
}
