//! Events reported by the console's background tasks
//!
//! Discovery, the command path and the liveness watcher never touch a
//! presentation layer directly. They push [`ConsoleEvent`]s into a channel
//! and a single consumer decides how to render them.

use tokio::sync::mpsc;

use om_core::LivenessState;

/// Channel capacity for console events.
///
/// Events are small and produced at human pace (one per command, one per
/// liveness change), so 256 only fills up if the consumer has stalled.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something a console component wants the user to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// Free-form progress message
    Status(String),

    /// Startup discovery found a port
    PortFound(u16),

    /// Startup discovery gave up
    PortNotFound,

    /// Command connection established
    Connected { port: u16 },

    /// Command connection attempt failed
    ConnectFailed(String),

    /// Response text for a command, `<no response>` if nothing arrived
    Response(String),

    /// A send failed; the connection was dropped
    Failure(String),

    /// Liveness changed since the previous tick
    Liveness(LivenessState),
}

/// Sending half of the event channel
///
/// Emitting never blocks: if the consumer is gone or behind, the event is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<ConsoleEvent>>,
}

impl EventSink {
    /// Sink that discards everything
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Wrap an existing sender
    pub fn new(tx: mpsc::Sender<ConsoleEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Publish an event without waiting
    pub fn emit(&self, event: ConsoleEvent) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.try_send(event) {
                tracing::trace!("Dropped console event: {}", e);
            }
        }
    }
}

/// Create an event sink and its receiver
pub fn channel() -> (EventSink, mpsc::Receiver<ConsoleEvent>) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    (EventSink::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_receiver() {
        let (sink, mut rx) = channel();
        sink.emit(ConsoleEvent::PortFound(9938));
        assert_eq!(rx.recv().await, Some(ConsoleEvent::PortFound(9938)));
    }

    #[test]
    fn test_disabled_sink_is_silent() {
        EventSink::disabled().emit(ConsoleEvent::PortNotFound);
    }

    #[test]
    fn test_emit_after_receiver_dropped_does_not_panic() {
        let (sink, rx) = channel();
        drop(rx);
        sink.emit(ConsoleEvent::Status("gone".to_string()));
    }
}
