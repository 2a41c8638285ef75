//! Raw TCP transport.
//!
//! Drives one connection through its lifecycle and runs the outbound
//! packet pipeline.
//!
//! # Bridge Task
//!
//! `open()` spawns a bridge task which:
//!
//! - Calls the connector with a freshly built descriptor
//! - Stores the socket handle and fires `Open` on success
//! - Fires `Error` on connect failure
//! - Translates handle events (data, write completions, end, errors) into
//!   state changes and upward events
//!
//! All state lives behind one mutex and every transition happens while it
//! is held, so the transport behaves as a single stream of control.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::capability::Capabilities;
use crate::config::TransportOptions;
use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};
use crate::protocol::{EngineIoCodec, Frame, Packet, PacketEncoder};
use crate::socket::{BoxedStream, Connector, HandleEvent, SocketHandle, TcpConnector};

use super::drain::DrainController;
use super::{ReadyState, Transport, TransportEvent, TransportEvents};

// ============================================================================
// Constants
// ============================================================================

/// Name reported by [`TcpTransport`].
pub const TRANSPORT_NAME: &str = "tcp";

// ============================================================================
// Shared State
// ============================================================================

/// Mutable transport state.
struct Inner {
    state: ReadyState,
    /// Present only while open or closing.
    handle: Option<SocketHandle>,
    drain: DrainController,
}

/// State shared between the transport and its bridge task.
struct Shared {
    inner: Mutex<Inner>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl Shared {
    fn emit(&self, event: TransportEvent) {
        // The receiver may be gone; events are then dropped.
        let _ = self.events.send(event);
    }

    fn on_connect_error(&self, error: Error) {
        let mut inner = self.inner.lock();

        if inner.state != ReadyState::Opening {
            debug!(error = %error, state = %inner.state, "Connect failed after transport left opening");
            return;
        }

        warn!(error = %error, "Connect failed");
        inner.state = ReadyState::Closed;
        self.emit(TransportEvent::Error(error));
    }

    /// Stores the connected stream. Returns the handle's events, or `None`
    /// if the transport was closed while connecting.
    fn on_connected(
        &self,
        stream: BoxedStream,
        max_frame_size: usize,
    ) -> Option<mpsc::UnboundedReceiver<HandleEvent>> {
        let mut inner = self.inner.lock();

        if inner.state != ReadyState::Opening {
            debug!(state = %inner.state, "Discarding connection of closed transport");
            return None;
        }

        let (handle, handle_events) = SocketHandle::spawn(stream, max_frame_size);
        inner.handle = Some(handle);
        inner.state = ReadyState::Open;

        info!("Transport open");
        self.emit(TransportEvent::Open);

        Some(handle_events)
    }

    fn on_data(&self, frame: Frame) {
        let inner = self.inner.lock();

        if inner.state == ReadyState::Open {
            self.emit(TransportEvent::Data(frame));
        } else {
            trace!(state = %inner.state, "Dropping frame received after close");
        }
    }

    fn on_frame_written(&self) {
        let mut inner = self.inner.lock();

        if inner.state != ReadyState::Open {
            trace!(state = %inner.state, "Ignoring write completion after close");
            return;
        }

        if inner.drain.frame_written() {
            self.emit(TransportEvent::Drain);
        }
        trace!(outstanding = inner.drain.outstanding(), "Frame written");
    }

    /// Handles a clean termination: remote end or completed local end.
    fn on_end(&self) {
        let handle = {
            let mut inner = self.inner.lock();

            match inner.state {
                ReadyState::Open | ReadyState::Closing => {
                    debug!(state = %inner.state, "Transport closed");
                    inner.state = ReadyState::Closed;
                    self.emit(TransportEvent::Close);
                    inner.handle.take()
                }
                _ => None,
            }
        };

        drop(handle);
    }

    fn on_socket_error(&self, error: Error) {
        let handle = {
            let mut inner = self.inner.lock();

            match inner.state {
                ReadyState::Open => {
                    warn!(error = %error, "Socket error");
                    inner.state = ReadyState::Closed;
                    self.emit(TransportEvent::Error(error));
                    inner.handle.take()
                }
                // Termination was requested locally.
                ReadyState::Closing => {
                    debug!(error = %error, "Socket error while closing");
                    inner.state = ReadyState::Closed;
                    self.emit(TransportEvent::Close);
                    inner.handle.take()
                }
                _ => None,
            }
        };

        drop(handle);
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Connects and then forwards handle events until the handle terminates.
async fn run_bridge<C: Connector>(
    shared: Arc<Shared>,
    connector: Arc<C>,
    descriptor: ConnectionDescriptor,
    max_frame_size: usize,
) {
    let stream = match connector.connect(descriptor).await {
        Ok(stream) => stream,
        Err(e) => {
            shared.on_connect_error(e);
            return;
        }
    };

    let Some(mut handle_events) = shared.on_connected(stream, max_frame_size) else {
        return;
    };

    while let Some(event) = handle_events.recv().await {
        match event {
            HandleEvent::Data(frame) => shared.on_data(frame),
            HandleEvent::Written => shared.on_frame_written(),
            HandleEvent::End | HandleEvent::Ended => {
                shared.on_end();
                return;
            }
            HandleEvent::Error(e) => {
                shared.on_socket_error(e);
                return;
            }
        }
    }

    // Both I/O tasks are gone without reporting.
    shared.on_end();
}

// ============================================================================
// TcpTransport
// ============================================================================

/// Transport over a raw TCP (optionally TLS) connection.
///
/// # Example
///
/// ```ignore
/// use eio_tcp_transport::{Packet, TcpTransport, Transport, TransportEvent, TransportOptions};
///
/// let options = TransportOptions::new("localhost").with_port(3000);
/// let (transport, mut events) = TcpTransport::new(options)?;
///
/// transport.open()?;
/// while let Some(event) = events.recv().await {
///     match event {
///         TransportEvent::Open => transport.write(vec![Packet::message("hello")])?,
///         TransportEvent::Data(frame) => println!("{frame:?}"),
///         TransportEvent::Close | TransportEvent::Error(_) => break,
///         TransportEvent::Drain => {}
///     }
/// }
/// ```
pub struct TcpTransport<C: Connector = TcpConnector> {
    options: TransportOptions,
    capabilities: Capabilities,
    connector: Arc<C>,
    encoder: Arc<dyn PacketEncoder>,
    shared: Arc<Shared>,
}

impl TcpTransport<TcpConnector> {
    /// Creates a transport using [`TcpConnector`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid.
    pub fn new(options: TransportOptions) -> Result<(Self, TransportEvents)> {
        Self::with_connector(options, TcpConnector::new())
    }
}

impl<C: Connector> TcpTransport<C> {
    /// Creates a transport using a custom connector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid.
    pub fn with_connector(
        options: TransportOptions,
        connector: C,
    ) -> Result<(Self, TransportEvents)> {
        options.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: ReadyState::Idle,
                handle: None,
                drain: DrainController::new(options.drain_policy),
            }),
            events: events_tx,
        });

        let transport = Self {
            capabilities: Capabilities::from_options(&options),
            options,
            connector: Arc::new(connector),
            encoder: Arc::new(EngineIoCodec),
            shared,
        };

        Ok((transport, TransportEvents::new(events_rx)))
    }

    /// Replaces the packet encoder.
    #[must_use]
    pub fn with_encoder(mut self, encoder: impl PacketEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Applies capabilities discovered outside the options, such as a peer
    /// known to lack binary support.
    ///
    /// Binary support can only be narrowed: it stays off once the options
    /// or an earlier call disabled it. Takes effect for the next `open()`
    /// and every later write.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        if !capabilities.supports_binary() {
            self.capabilities = self.capabilities.without_binary();
        }
        self
    }

    /// Returns the options this transport was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Returns the negotiated capabilities.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Builds the descriptor the next connect would use.
    #[must_use]
    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::build(&self.options, self.capabilities)
    }
}

impl<C: Connector> Transport for TcpTransport<C> {
    fn name(&self) -> &'static str {
        TRANSPORT_NAME
    }

    fn ready_state(&self) -> ReadyState {
        self.shared.inner.lock().state
    }

    fn is_writable(&self) -> bool {
        let inner = self.shared.inner.lock();
        inner.state == ReadyState::Open && inner.drain.is_writable()
    }

    fn supports_binary(&self) -> bool {
        self.capabilities.supports_binary()
    }

    fn open(&self) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("open() must be called within a tokio runtime"))?;

        {
            let mut inner = self.shared.inner.lock();
            if inner.state != ReadyState::Idle {
                return Err(Error::invalid_state("open", inner.state));
            }
            inner.state = ReadyState::Opening;
        }

        let descriptor = self.descriptor();
        debug!(
            host = %descriptor.hostname,
            port = descriptor.port,
            path = %descriptor.path,
            secure = descriptor.scheme.is_secure(),
            "Opening transport"
        );

        runtime.spawn(run_bridge(
            Arc::clone(&self.shared),
            Arc::clone(&self.connector),
            descriptor,
            self.options.max_frame_size,
        ));

        Ok(())
    }

    fn write(&self, packets: Vec<Packet>) -> Result<()> {
        let mut inner = self.shared.inner.lock();

        if inner.state != ReadyState::Open {
            return Err(Error::invalid_state("write", inner.state));
        }
        if !inner.drain.is_writable() {
            return Err(Error::NotWritable);
        }

        let supports_binary = self.capabilities.supports_binary();
        let frames = packets
            .iter()
            .map(|packet| self.encoder.encode(packet, supports_binary))
            .collect::<Result<Vec<_>>>()?;

        let Inner { handle, drain, .. } = &mut *inner;
        let handle = handle.as_ref().ok_or(Error::ConnectionClosed)?;

        if !drain.begin_batch(frames.len()) {
            self.shared.emit(TransportEvent::Drain);
            return Ok(());
        }

        for frame in frames {
            trace!(len = frame.len(), text = frame.is_text(), "Writing frame");
            match frame {
                Frame::Text(text) => handle.write(text)?,
                Frame::Binary(chunks) => handle.write_vectored(chunks)?,
            }
        }

        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock();

        match inner.state {
            ReadyState::Idle | ReadyState::Closing | ReadyState::Closed => {
                trace!(state = %inner.state, "Close ignored");
            }
            ReadyState::Opening => {
                debug!("Closing transport before connect completed");
                inner.state = ReadyState::Closed;
                self.shared.emit(TransportEvent::Close);
            }
            ReadyState::Open => {
                debug!("Closing transport");
                inner.state = ReadyState::Closing;
                if let Some(handle) = inner.handle.as_ref() {
                    handle.end();
                }
            }
        }

        Ok(())
    }
}

impl<C: Connector> Drop for TcpTransport<C> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
