//! Startup port discovery
//!
//! Polls [`PortDiscovery`] on a [`RetrySchedule`] until a port turns up,
//! the attempt budget runs out, or the owning client is closed.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use om_core::config::DiscoveryRetryConfig;
use om_core::PortDiscovery;

use crate::backoff::RetrySchedule;
use crate::client::CommandClient;
use crate::events::{ConsoleEvent, EventSink};
use crate::state::ConsoleState;

/// Retry discovery and store the port in `state` once found
///
/// The stop token is checked before every attempt and raced against every
/// sleep, so closing the client ends the loop promptly.
pub async fn discover_with_retry(
    state: &ConsoleState,
    discovery: &PortDiscovery,
    retry: &DiscoveryRetryConfig,
    events: &EventSink,
) -> Option<u16> {
    let stop: CancellationToken = state.stop_token();
    let mut schedule = RetrySchedule::new(retry);
    let attempts = schedule.attempts();

    events.emit(ConsoleEvent::Status("Searching for openMSX...".to_string()));

    let mut attempt = 0;
    loop {
        attempt += 1;
        if stop.is_cancelled() {
            tracing::debug!("Discovery stopped before attempt {}", attempt);
            return None;
        }

        if let Some(port) = discovery.discover().await {
            tracing::info!("Found openMSX command port {} (attempt {})", port, attempt);
            state.set_port(Some(port));
            events.emit(ConsoleEvent::PortFound(port));
            return Some(port);
        }

        let Some(delay) = schedule.after_miss() else {
            break;
        };
        tracing::debug!(
            "No port in {} (attempt {}/{}), retrying in {:?}",
            discovery.dir().display(),
            attempt,
            attempts,
            delay
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop.cancelled() => {
                tracing::debug!("Discovery stopped while waiting");
                return None;
            }
        }
    }

    tracing::info!("Gave up looking for openMSX after {} attempts", attempts);
    events.emit(ConsoleEvent::PortNotFound);
    None
}

/// Run [`discover_with_retry`] in the background for `client`
pub fn spawn_discovery(
    client: Arc<CommandClient>,
    discovery: PortDiscovery,
) -> JoinHandle<Option<u16>> {
    tokio::spawn(async move {
        let retry = client.config().discovery.clone();
        discover_with_retry(client.state(), &discovery, &retry, client.events()).await
    })
}
