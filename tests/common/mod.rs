//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::future::pending;
use std::time::Duration;

use async_trait::async_trait;
use eio_tcp_transport::{BoxedStream, ConnectionDescriptor, Connector, Error, Result};
use parking_lot::Mutex;
use tokio::io::{DuplexStream, duplex};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

/// Buffer size of in-memory streams.
pub const DUPLEX_CAPACITY: usize = 64 * 1024;

/// Upper bound on any single wait in a test.
pub const WAIT: Duration = Duration::from_secs(5);

/// Installs a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Awaits `future`, panicking after [`WAIT`].
pub async fn within<F: Future>(future: F) -> F::Output {
    timeout(WAIT, future).await.expect("timed out")
}

// ============================================================================
// Connectors
// ============================================================================

/// Server side of an accepted in-memory connection.
pub struct Accepted {
    pub descriptor: ConnectionDescriptor,
    pub server: DuplexStream,
}

/// Hands out in-memory streams and passes the server half to the test.
pub struct DuplexConnector {
    accepted: mpsc::UnboundedSender<Accepted>,
}

impl DuplexConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Accepted>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { accepted: tx }, rx)
    }
}

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self, descriptor: ConnectionDescriptor) -> Result<BoxedStream> {
        let (client, server) = duplex(DUPLEX_CAPACITY);
        let _ = self.accepted.send(Accepted { descriptor, server });
        Ok(Box::new(client))
    }
}

/// Always fails with the given message.
pub struct FailingConnector {
    pub message: &'static str,
}

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(&self, _descriptor: ConnectionDescriptor) -> Result<BoxedStream> {
        Err(Error::connection(self.message))
    }
}

/// Never completes.
pub struct PendingConnector;

#[async_trait]
impl Connector for PendingConnector {
    async fn connect(&self, _descriptor: ConnectionDescriptor) -> Result<BoxedStream> {
        pending().await
    }
}

/// Completes only after the test releases the gate.
pub struct GatedConnector {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    accepted: mpsc::UnboundedSender<Accepted>,
}

impl GatedConnector {
    pub fn new() -> (
        Self,
        oneshot::Sender<()>,
        mpsc::UnboundedReceiver<Accepted>,
    ) {
        let (gate_tx, gate_rx) = oneshot::channel();
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        let connector = Self {
            gate: Mutex::new(Some(gate_rx)),
            accepted: accepted_tx,
        };
        (connector, gate_tx, accepted_rx)
    }
}

#[async_trait]
impl Connector for GatedConnector {
    async fn connect(&self, descriptor: ConnectionDescriptor) -> Result<BoxedStream> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.await.map_err(|_| Error::connection("gate dropped"))?;
        }

        let (client, server) = duplex(DUPLEX_CAPACITY);
        let _ = self.accepted.send(Accepted { descriptor, server });
        Ok(Box::new(client))
    }
}
