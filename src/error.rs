//! Error types for the TCP transport.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use eio_tcp_transport::{Packet, Result, TcpTransport, Transport, TransportOptions};
//!
//! fn send_hello(transport: &TcpTransport) -> Result<()> {
//!     transport.write(vec![Packet::message("hello")])?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Tls`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::Handshake`], [`Error::HandshakeRejected`], [`Error::ProxyRejected`] |
//! | Lifecycle | [`Error::InvalidState`], [`Error::NotWritable`] |
//! | Protocol | [`Error::Protocol`], [`Error::FrameTooLarge`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Rustls`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::transport::ReadyState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when transport options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// TLS setup error.
    ///
    /// Returned when TLS material cannot be turned into a client configuration.
    #[error("TLS error: {message}")]
    Tls {
        /// Description of the TLS error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Socket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connect attempt exceeded the connector's timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection closed while an operation still needed it.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Upgrade handshake could not be parsed.
    #[error("Handshake failed: {message}")]
    Handshake {
        /// Description of the handshake failure.
        message: String,
    },

    /// Server answered the upgrade request with something other than `101`.
    #[error("Handshake rejected with status {status}")]
    HandshakeRejected {
        /// HTTP status code returned by the server.
        status: u16,
    },

    /// Proxy refused the `CONNECT` tunnel.
    #[error("Proxy rejected tunnel with status {status}")]
    ProxyRejected {
        /// HTTP status code returned by the proxy.
        status: u16,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Operation is not allowed in the current lifecycle state.
    #[error("Cannot {operation} while transport is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State the transport was in.
        state: ReadyState,
    },

    /// A write batch was submitted before the previous one drained.
    #[error("Transport is not writable")]
    NotWritable,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed frame or packet.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Inbound frame exceeds the configured limit.
    #[error("Frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Announced frame size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by rustls.
    #[error("Rustls error: {0}")]
    Rustls(#[from] rustls::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a TLS error.
    #[inline]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(operation: &'static str, state: ReadyState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a frame too large error.
    #[inline]
    pub fn frame_too_large(size: usize, max: usize) -> Self {
        Self::FrameTooLarge { size, max }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::Handshake { .. }
                | Self::HandshakeRejected { .. }
                | Self::ProxyRejected { .. }
                | Self::Io(_)
        )
    }

    /// Returns `true` if the caller misused the transport lifecycle.
    #[inline]
    #[must_use]
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self, Self::InvalidState { .. } | Self::NotWritable)
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed when the layer above retries with a
    /// fresh transport instance.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::Io(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
