//! TCP command client for the openMSX console port
//!
//! Holds at most one connection to `127.0.0.1:<port>`. The connection is
//! opened lazily on the first send after a port is known, reused while it
//! works, and dropped on any transport error so the next send starts fresh.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use om_core::config::ConsoleConfig;
use om_core::text::decode_lossy;
use om_core::{ConnectionState, ConsoleError};

use crate::drain::{read_until_quiet, DrainLimits, Drained};
use crate::events::{ConsoleEvent, EventSink};
use crate::state::ConsoleState;

/// Marker rendered when a command produced no output
pub const NO_RESPONSE: &str = "<no response>";

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Text received before the line went quiet
    Text(String),
    /// Nothing arrived before the quiet period or deadline
    NoResponse,
}

impl Response {
    /// Response text, if any arrived
    pub fn text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text),
            Response::NoResponse => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Text(text) => write!(f, "{}", text),
            Response::NoResponse => write!(f, "{}", NO_RESPONSE),
        }
    }
}

/// Ensure a command ends with exactly one newline
pub fn normalize_command(command: &str) -> String {
    let mut line = command.trim_end().to_string();
    line.push('\n');
    line
}

/// Client for the emulator's line-oriented command port
///
/// Cheap to share behind an `Arc`; concurrent sends are serialized by the
/// connection lock in [`ConsoleState`].
#[derive(Debug)]
pub struct CommandClient {
    state: Arc<ConsoleState>,
    config: ConsoleConfig,
    events: EventSink,
}

impl CommandClient {
    /// Create a client with fresh state
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_state(Arc::new(ConsoleState::new()), config)
    }

    /// Create a client over existing shared state
    pub fn with_state(state: Arc<ConsoleState>, config: ConsoleConfig) -> Self {
        Self {
            state,
            config,
            events: EventSink::disabled(),
        }
    }

    /// Report connects, responses and failures to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Shared state (port hint, connection, stop token)
    pub fn state(&self) -> &Arc<ConsoleState> {
        &self.state
    }

    /// Client configuration
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Event sink used by this client
    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Currently known port
    pub fn port(&self) -> Option<u16> {
        self.state.port()
    }

    /// Set the port to dial; takes effect on the next connect
    pub fn set_port(&self, port: u16) {
        self.state.set_port(Some(port));
    }

    /// Current connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.state.connection_state()
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.state.is_stopped()
    }

    /// Make sure a connection is open
    ///
    /// Returns `false` without side effects when no port is known. An
    /// existing connection is reused without a new attempt.
    pub async fn ensure_connected(&self) -> bool {
        if self.is_closed() || self.port().is_none() {
            return false;
        }
        let mut slot = self.state.lock_connection().await;
        self.connect_locked(&mut slot).await.is_ok()
    }

    /// Connect if `slot` is empty; caller holds the connection lock
    async fn connect_locked(&self, slot: &mut Option<TcpStream>) -> Result<(), ConsoleError> {
        if slot.is_some() {
            return Ok(());
        }

        let port = self.port().ok_or(ConsoleError::NotConnected)?;
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

        self.state.record_connect_attempt();
        self.state.set_connection_state(ConnectionState::Connecting);
        tracing::debug!("Connecting to openMSX at {}", addr);

        let reason = match timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!("Failed to set TCP_NODELAY: {}", e);
                }
                *slot = Some(stream);
                self.state.set_connection_state(ConnectionState::Connected);
                tracing::info!("Connected to openMSX at {}", addr);
                self.events.emit(ConsoleEvent::Connected { port });
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.config.connect_timeout),
        };

        self.state.set_connection_state(ConnectionState::Disconnected);
        tracing::warn!("Connect to {} failed: {}", addr, reason);
        self.events
            .emit(ConsoleEvent::ConnectFailed(format!("Connect failed: {}", reason)));
        Err(ConsoleError::ConnectFailed {
            addr: addr.to_string(),
            reason,
        })
    }

    /// Send one command and collect its response
    ///
    /// Connects first if needed. On any I/O error the connection is dropped
    /// and the next call reconnects.
    pub async fn send(&self, command: &str) -> Result<Response, ConsoleError> {
        if self.is_closed() {
            return Err(ConsoleError::Closed);
        }
        if self.port().is_none() {
            return Err(ConsoleError::NotConnected);
        }

        let mut slot = self.state.lock_connection().await;
        self.connect_locked(&mut slot).await?;
        let Some(stream) = slot.as_mut() else {
            return Err(ConsoleError::NotConnected);
        };

        let payload = normalize_command(command);
        let limits = DrainLimits::from_config(&self.config);

        let result: std::io::Result<Drained> = async {
            timeout(self.config.write_timeout, stream.write_all(payload.as_bytes()))
                .await
                .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "write timed out"))??;
            stream.flush().await?;
            read_until_quiet(stream, &limits).await
        }
        .await;

        match result {
            Ok(drained) => {
                if drained.eof {
                    tracing::info!("openMSX closed the command connection");
                    *slot = None;
                    self.state.set_connection_state(ConnectionState::Disconnected);
                }

                let text = decode_lossy(&drained.bytes);
                let response = if text.is_empty() {
                    Response::NoResponse
                } else {
                    Response::Text(text)
                };
                self.events.emit(ConsoleEvent::Response(response.to_string()));
                Ok(response)
            }
            Err(e) => {
                // dropping the stream closes it
                *slot = None;
                self.state.set_connection_state(ConnectionState::Disconnected);
                tracing::warn!("Command transport failed: {}", e);
                self.events.emit(ConsoleEvent::Failure(format!("<error: {}>", e)));
                Err(ConsoleError::Transport(e.to_string()))
            }
        }
    }

    /// Close the connection and stop background discovery
    ///
    /// Safe to call more than once.
    pub async fn close(&self) {
        self.state.stop();

        let mut slot = self.state.lock_connection().await;
        if let Some(mut stream) = slot.take() {
            let _ = stream.shutdown().await;
            tracing::debug!("Command connection closed");
        }
        self.state.set_connection_state(ConnectionState::Disconnected);
    }
}
