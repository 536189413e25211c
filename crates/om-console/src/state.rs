//! Shared console state
//!
//! One [`ConsoleState`] is shared by a command client and its startup
//! discovery task. The liveness watcher does not get one.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use om_core::ConnectionState;

/// Port hint, connection handle and lifecycle flags for one client
#[derive(Debug)]
pub struct ConsoleState {
    /// Discovered port; replaced whole, never partially updated
    port: watch::Sender<Option<u16>>,
    /// The single command connection, only touched under this lock
    connection: Mutex<Option<TcpStream>>,
    /// Published connection state
    status: watch::Sender<ConnectionState>,
    /// Number of real connect attempts made
    connect_attempts: AtomicU64,
    /// Cancelled when the client is closed
    stop: CancellationToken,
}

impl ConsoleState {
    /// Create state with no port and no connection
    pub fn new() -> Self {
        let (port, _) = watch::channel(None);
        let (status, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            port,
            connection: Mutex::new(None),
            status,
            connect_attempts: AtomicU64::new(0),
            stop: CancellationToken::new(),
        }
    }

    /// Current port hint
    pub fn port(&self) -> Option<u16> {
        *self.port.borrow()
    }

    /// Replace the port hint
    pub fn set_port(&self, port: Option<u16>) {
        self.port.send_replace(port);
    }

    /// Subscribe to port hint changes
    pub fn watch_port(&self) -> watch::Receiver<Option<u16>> {
        self.port.subscribe()
    }

    /// Current connection state
    pub fn connection_state(&self) -> ConnectionState {
        *self.status.borrow()
    }

    /// Subscribe to connection state changes
    pub fn watch_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.status.subscribe()
    }

    pub(crate) fn set_connection_state(&self, state: ConnectionState) {
        self.status.send_replace(state);
    }

    pub(crate) async fn lock_connection(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.connection.lock().await
    }

    pub(crate) fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of connect attempts made so far
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Token cancelled when the client is closed
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Whether the client has been closed
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub(crate) fn stop(&self) {
        self.stop.cancel();
    }
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = ConsoleState::new();
        assert_eq!(state.port(), None);
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);
        assert_eq!(state.connect_attempts(), 0);
        assert!(!state.is_stopped());
    }

    #[tokio::test]
    async fn test_port_changes_are_observable() {
        let state = ConsoleState::new();
        let mut rx = state.watch_port();
        state.set_port(Some(9938));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(9938));
        assert_eq!(state.port(), Some(9938));
    }

    #[tokio::test]
    async fn test_connection_state_changes_are_observable() {
        let state = ConsoleState::new();
        let mut rx = state.watch_connection_state();
        state.set_connection_state(ConnectionState::Connecting);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionState::Connecting);
    }

    #[test]
    fn test_stop_is_sticky() {
        let state = ConsoleState::new();
        let token = state.stop_token();
        state.stop();
        state.stop();
        assert!(token.is_cancelled());
        assert!(state.is_stopped());
    }
}
