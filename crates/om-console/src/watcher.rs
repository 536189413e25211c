//! Liveness watcher
//!
//! Answers "is the emulator up?" on a fixed cadence, independently of any
//! command client. Each tick rediscovers the port (or uses a pinned one)
//! and tries a throwaway connect to it; nothing is remembered between ticks.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use om_core::config::WatcherConfig;
use om_core::{LivenessState, PortDiscovery};

use crate::events::{ConsoleEvent, EventSink};

/// Shortest cadence the loop will run at; a zero interval is raised to this
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Try a TCP connect to `127.0.0.1:port` and drop it immediately
pub async fn probe(port: u16, probe_timeout: Duration) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    match tokio::time::timeout(probe_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::trace!("Probe of {} failed: {}", addr, e);
            false
        }
        Err(_) => {
            tracing::trace!("Probe of {} timed out", addr);
            false
        }
    }
}

/// Periodic discovery plus reachability probe
pub struct LivenessWatcher {
    discovery: PortDiscovery,
    config: WatcherConfig,
    events: EventSink,
    pinned_port: Option<u16>,
}

impl LivenessWatcher {
    pub fn new(discovery: PortDiscovery, config: WatcherConfig) -> Self {
        Self {
            discovery,
            config,
            events: EventSink::disabled(),
            pinned_port: None,
        }
    }

    /// Check `port` every tick instead of reading the rendezvous directory
    pub fn with_port(mut self, port: u16) -> Self {
        self.pinned_port = Some(port);
        self
    }

    /// Report liveness changes to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Compute liveness once
    pub async fn tick(&self) -> LivenessState {
        let port = match self.pinned_port {
            Some(port) => Some(port),
            None => self.discovery.discover().await,
        };
        match port {
            Some(port) => LivenessState {
                port: Some(port),
                reachable: probe(port, self.config.probe_timeout).await,
            },
            None => LivenessState::unknown(),
        }
    }

    /// Start the watcher loop in the background
    ///
    /// The receiver sees a fresh value every tick; the first tick runs
    /// immediately.
    pub fn spawn(
        self,
        cancel: CancellationToken,
    ) -> (JoinHandle<()>, watch::Receiver<LivenessState>) {
        let (tx, rx) = watch::channel(LivenessState::unknown());
        let handle = tokio::spawn(self.run(tx, cancel));
        (handle, rx)
    }

    /// Run until `cancel` fires
    pub async fn run(self, tx: watch::Sender<LivenessState>, cancel: CancellationToken) {
        let period = self.config.interval.max(MIN_INTERVAL);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        match self.pinned_port {
            Some(port) => tracing::info!(
                "Starting liveness watcher on port {} (interval: {:?}, timeout: {:?})",
                port,
                period,
                self.config.probe_timeout
            ),
            None => tracing::info!(
                "Starting liveness watcher on {} (interval: {:?}, timeout: {:?})",
                self.discovery.dir().display(),
                period,
                self.config.probe_timeout
            ),
        }

        let mut last: Option<LivenessState> = None;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = cancel.cancelled() => {
                    tracing::info!("Liveness watcher shutting down");
                    break;
                }
            }

            let state = tokio::select! {
                state = self.tick() => state,
                _ = cancel.cancelled() => {
                    tracing::info!("Liveness watcher shutting down");
                    break;
                }
            };

            if last != Some(state) {
                tracing::info!("openMSX {}", state);
                self.events.emit(ConsoleEvent::Liveness(state));
                last = Some(state);
            }

            tx.send_replace(state);
        }
    }
}
