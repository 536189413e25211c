//! Quiet-period response reading
//!
//! The openMSX console protocol has no response framing: no length prefix
//! and no guaranteed terminator, and a single response may arrive as several
//! writes. A response is therefore taken to be everything that arrives until
//! the line goes quiet for [`DrainLimits::quiet_period`], capped by
//! [`DrainLimits::hard_deadline`].

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout, Instant};

use om_core::config::ConsoleConfig;

/// Bounds for one drain
#[derive(Debug, Clone, Copy)]
pub struct DrainLimits {
    /// Idle gap that ends the response
    pub quiet_period: Duration,
    /// Maximum total time, measured from the start of the drain
    pub hard_deadline: Duration,
    /// Bytes requested per read
    pub chunk_size: usize,
}

impl DrainLimits {
    /// Limits taken from console configuration
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            quiet_period: config.quiet_period,
            hard_deadline: config.hard_deadline,
            chunk_size: config.read_chunk_size.max(1),
        }
    }
}

impl Default for DrainLimits {
    fn default() -> Self {
        Self::from_config(&ConsoleConfig::default())
    }
}

/// Bytes collected by one drain
#[derive(Debug, Default)]
pub struct Drained {
    /// Everything received, in order
    pub bytes: BytesMut,
    /// Peer closed its side during the drain
    pub eof: bool,
}

/// Read until the peer goes quiet, closes, or the hard deadline passes
///
/// Each received chunk restarts the quiet timer. A read error is returned
/// as-is; the caller owns the decision to drop the connection.
pub async fn read_until_quiet<R>(reader: &mut R, limits: &DrainLimits) -> io::Result<Drained>
where
    R: AsyncRead + Unpin,
{
    let deadline = Instant::now() + limits.hard_deadline;
    let mut drained = Drained {
        bytes: BytesMut::with_capacity(limits.chunk_size),
        eof: false,
    };

    loop {
        let now = Instant::now();
        if now >= deadline {
            tracing::trace!("Hard deadline reached after {} bytes", drained.bytes.len());
            break;
        }
        let wait = limits.quiet_period.min(deadline - now);

        drained.bytes.reserve(limits.chunk_size);
        match timeout(wait, reader.read_buf(&mut drained.bytes)).await {
            // quiet period (or the remainder of the hard deadline) elapsed
            Err(_) => break,
            Ok(Ok(0)) => {
                drained.eof = true;
                break;
            }
            Ok(Ok(n)) => tracing::trace!("Received {} bytes", n),
            Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
            Ok(Err(e)) => return Err(e),
        }
    }

    Ok(drained)
}
