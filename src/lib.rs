//! Engine.io client transport over raw TCP.
//!
//! This library provides the `tcp` transport of an engine.io client: a
//! length-prefixed frame stream over a plain or TLS TCP connection, opened
//! with an HTTP/1.1 upgrade handshake.
//!
//! # Architecture
//!
//! The transport sits between a connection manager (one layer up) and a
//! socket primitive (one layer down):
//!
//! - **Manager**: Calls [`Transport::open`], [`Transport::write`] and
//!   [`Transport::close`], consumes [`TransportEvents`]
//! - **Transport**: Owns the lifecycle state machine, encodes packets,
//!   tracks writability
//! - **Socket**: [`Connector`] establishes the stream, a socket handle runs
//!   frame I/O on tokio tasks
//!
//! # Quick Start
//!
//! ```no_run
//! use eio_tcp_transport::{
//!     Packet, Result, TcpTransport, Transport, TransportEvent, TransportOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = TransportOptions::new("localhost")
//!         .with_port(3000)
//!         .with_timestamp_requests();
//!
//!     let (transport, mut events) = TcpTransport::new(options)?;
//!     transport.open()?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             TransportEvent::Open => transport.write(vec![Packet::message("hello")])?,
//!             TransportEvent::Drain => transport.close()?,
//!             TransportEvent::Data(frame) => println!("received {frame:?}"),
//!             TransportEvent::Error(e) => return Err(e),
//!             TransportEvent::Close => break,
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | Binary support negotiation |
//! | [`config`] | Transport options, query, TLS material |
//! | [`descriptor`] | Connection descriptor construction |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`nonce`] | Cache-busting nonce generator |
//! | [`protocol`] | Packet model and engine.io codec |
//! | [`socket`] | Connector, handshake, TLS, frame I/O |
//! | [`transport`] | Transport contract and TCP transport |

// ============================================================================
// Modules
// ============================================================================

/// Binary support flags.
pub mod capability;

/// Transport configuration.
///
/// Options can be built in code or deserialized from JSON.
pub mod config;

/// Connection descriptor.
pub mod descriptor;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Yeast-style nonce generator.
pub mod nonce;

/// Packet model and encoding.
pub mod protocol;

/// Socket primitive.
///
/// Lower-level building blocks used by [`TcpTransport`]; exposed for custom
/// connectors.
pub mod socket;

/// Transport contract and TCP transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use capability::Capabilities;
pub use config::{DrainPolicy, Query, TlsMaterial, TransportOptions};
pub use descriptor::{ConnectionDescriptor, Scheme};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{EngineIoCodec, Frame, Packet, PacketEncoder, PacketType, Payload};

// Socket types
pub use socket::{BoxedStream, Connector, TcpConnector};

// Transport types
pub use transport::{
    ReadyState, TRANSPORT_NAME, TcpTransport, Transport, TransportEvent, TransportEvents,
};
