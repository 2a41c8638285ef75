//! Socket primitive.
//!
//! Everything below the transport state machine: connecting, TLS, the
//! upgrade handshake, frame I/O.
//!
//! # Connection Sequence
//!
//! ```text
//! TcpConnector::connect(descriptor)
//!   ├─ TCP connect (host:port or proxy)
//!   ├─ CONNECT tunnel          (proxy only)
//!   ├─ TLS session             (https: only)
//!   └─ GET path?query Upgrade  (101 required)
//! SocketHandle::spawn(stream)
//!   ├─ reader task → Data / End / Error
//!   └─ writer task → Written / Ended / Error
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | `Connector` trait and `TcpConnector` |
//! | `handle` | Socket handle with reader and writer tasks |
//! | `handshake` | Upgrade request and proxy tunnel |
//! | `tls` | rustls client configuration |
//! | `wire` | Frame wire format |

// ============================================================================
// Submodules
// ============================================================================

/// Connector trait and TCP connector.
pub mod connector;

/// Socket handle and I/O tasks.
pub mod handle;

/// Upgrade handshake and proxy tunnel.
pub mod handshake;

/// TLS client setup.
pub mod tls;

/// Frame wire format.
pub mod wire;

// ============================================================================
// Re-exports
// ============================================================================

pub use connector::{BoxedStream, Connector, SocketStream, TcpConnector};
pub use handle::{HandleEvent, SocketHandle};
