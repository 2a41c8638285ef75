//! Connectors turn a descriptor into a ready-to-frame byte stream.
//!
//! A connector performs everything up to the first frame: TCP connect,
//! optional proxy tunnel, optional TLS and the upgrade handshake.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};

use super::{handshake, tls};

// ============================================================================
// Types
// ============================================================================

/// Byte stream usable by a socket handle.
pub trait SocketStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> SocketStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Boxed connected stream.
pub type BoxedStream = Box<dyn SocketStream>;

// ============================================================================
// Connector
// ============================================================================

/// Establishes connections described by a [`ConnectionDescriptor`].
///
/// Implementations own timeouts and validation of TLS material; the
/// transport reports whatever error they return unchanged.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connects and returns a stream ready for frames.
    async fn connect(&self, descriptor: ConnectionDescriptor) -> Result<BoxedStream>;
}

// ============================================================================
// TcpConnector
// ============================================================================

/// Default connector over `tokio::net::TcpStream`.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
}

impl TcpConnector {
    /// Creates a connector without a connect timeout.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: None,
        }
    }

    /// Bounds the whole connect sequence, handshake included.
    #[inline]
    #[must_use]
    pub const fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = Some(limit);
        self
    }

    /// Returns the configured connect timeout.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    async fn establish(&self, descriptor: &ConnectionDescriptor) -> Result<BoxedStream> {
        let authority = descriptor.authority();

        let mut tcp = match &descriptor.proxy {
            Some(proxy) => {
                let mut stream = TcpStream::connect(proxy.as_str()).await?;
                handshake::tunnel(&mut stream, &authority).await?;
                stream
            }
            None => TcpStream::connect((descriptor.hostname.as_str(), descriptor.port)).await?,
        };
        tcp.set_nodelay(true)?;

        debug!(%authority, secure = descriptor.scheme.is_secure(), "TCP connection established");

        if descriptor.scheme.is_secure() {
            let mut stream = tls::connect(tcp, &descriptor.hostname, &descriptor.tls).await?;
            handshake::upgrade(&mut stream, descriptor).await?;
            Ok(Box::new(stream))
        } else {
            handshake::upgrade(&mut tcp, descriptor).await?;
            Ok(Box::new(tcp))
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, descriptor: ConnectionDescriptor) -> Result<BoxedStream> {
        match self.connect_timeout {
            Some(limit) => timeout(limit, self.establish(&descriptor))
                .await
                .map_err(|_| Error::connection_timeout(limit.as_millis() as u64))?,
            None => self.establish(&descriptor).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
