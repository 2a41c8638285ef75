//! Transport contract and the TCP transport.
//!
//! A transport is one interchangeable channel used by a connection manager
//! one layer up. The manager drives it through [`Transport`] and observes it
//! through [`TransportEvents`].
//!
//! # Lifecycle
//!
//! ```text
//!  idle ──open()──► opening ──connected──► open ──close()──► closing ──► closed
//!                      │                    │                              ▲
//!                      ├──connect error─────┼──socket error / remote end───┤
//!                      └──close()───────────┴──────────────────────────────┘
//! ```
//!
//! A closed transport is never reopened; the manager creates a new one.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `drain` | Writable flag and drain decisions |
//! | `tcp` | Raw TCP transport |

// ============================================================================
// Submodules
// ============================================================================

/// Write-side backpressure.
mod drain;

/// Raw TCP transport.
pub mod tcp;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::{Frame, Packet};

// ============================================================================
// Re-exports
// ============================================================================

pub use tcp::{TRANSPORT_NAME, TcpTransport};

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Created, `open()` not called yet.
    Idle,
    /// Connect in progress.
    Opening,
    /// Connected; writes accepted.
    Open,
    /// Local close in progress.
    Closing,
    /// Terminal.
    Closed,
}

impl ReadyState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Notifications delivered to the layer above.
#[derive(Debug)]
pub enum TransportEvent {
    /// Connected. Fires at most once.
    Open,
    /// Raw inbound frame, not decoded.
    Data(Frame),
    /// The transport accepts a new write batch.
    Drain,
    /// Connect or socket failure. The transport is closed afterwards.
    Error(Error),
    /// Closed locally or by the peer.
    Close,
}

// ============================================================================
// TransportEvents
// ============================================================================

/// Receiving side of a transport's events.
#[derive(Debug)]
pub struct TransportEvents {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

impl TransportEvents {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<TransportEvent>) -> Self {
        Self { rx }
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the transport and its tasks are gone.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.rx.try_recv().ok()
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Uniform contract of a transport.
///
/// Every method returns immediately; completions arrive as
/// [`TransportEvent`]s.
pub trait Transport: Send + Sync {
    /// Constant identifier of the transport kind.
    fn name(&self) -> &'static str;

    /// Current lifecycle state.
    fn ready_state(&self) -> ReadyState;

    /// Returns `true` if [`Transport::write`] will accept a batch.
    fn is_writable(&self) -> bool;

    /// Returns `true` if binary frames are sent as binary.
    fn supports_binary(&self) -> bool;

    /// Starts connecting. Eventually fires exactly one of `Open` or `Error`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the transport is idle.
    fn open(&self) -> Result<()>;

    /// Encodes and submits a batch of packets in order.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless the transport is open
    /// - [`Error::NotWritable`] while a previous batch has not drained
    fn write(&self, packets: Vec<Packet>) -> Result<()>;

    /// Tears the transport down. A no-op when idle or already closing.
    ///
    /// # Errors
    ///
    /// Implementations may fail if the close cannot be scheduled.
    fn close(&self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
