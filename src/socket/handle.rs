//! Socket handle and its I/O tasks.
//!
//! A handle owns one connected stream, split into a reader task and a
//! writer task. Both report to a single event channel consumed by the
//! transport.
//!
//! # Tasks
//!
//! - Reader: decodes frames, reports `Data`, `End` on clean EOF, `Error`
//! - Writer: writes frames in submission order, reports `Written` per
//!   frame, and on `end()` flushes, shuts down and reports `Ended`

// ============================================================================
// Imports
// ============================================================================

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::Frame;

use super::connector::BoxedStream;
use super::wire;

// ============================================================================
// HandleEvent
// ============================================================================

/// Events reported by a socket handle.
#[derive(Debug)]
pub enum HandleEvent {
    /// A complete inbound frame.
    Data(Frame),
    /// One submitted frame reached the stream.
    Written,
    /// The peer closed the stream.
    End,
    /// A local `end()` completed.
    Ended,
    /// Reading or writing failed. No further events follow from that task.
    Error(Error),
}

// ============================================================================
// HandleCommand
// ============================================================================

/// Internal commands for the writer task.
enum HandleCommand {
    /// Write a text frame.
    Text(String),
    /// Write a binary frame from chunks.
    Vectored(Vec<Vec<u8>>),
    /// Flush and shut down the write side.
    End,
}

// ============================================================================
// SocketHandle
// ============================================================================

/// Handle to a connected stream.
///
/// Dropping the handle aborts both I/O tasks.
pub struct SocketHandle {
    /// Channel for sending commands to the writer task.
    command_tx: mpsc::UnboundedSender<HandleCommand>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl SocketHandle {
    /// Spawns the I/O tasks for `stream`.
    ///
    /// Returns the handle and the receiver of its events.
    pub fn spawn(
        stream: BoxedStream,
        max_frame_size: usize,
    ) -> (Self, mpsc::UnboundedReceiver<HandleEvent>) {
        let (read_half, write_half) = tokio::io::split(stream);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(Self::run_reader(
            read_half,
            max_frame_size,
            event_tx.clone(),
        ));
        let writer = tokio::spawn(Self::run_writer(write_half, command_rx, event_tx));

        let handle = Self {
            command_tx,
            reader,
            writer,
        };

        (handle, event_rx)
    }

    /// Queues a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the writer task has stopped.
    pub fn write(&self, text: String) -> Result<()> {
        self.command_tx
            .send(HandleCommand::Text(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Queues a binary frame for a vectored write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the writer task has stopped.
    pub fn write_vectored(&self, chunks: Vec<Vec<u8>>) -> Result<()> {
        self.command_tx
            .send(HandleCommand::Vectored(chunks))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Ends the stream after all queued frames are written.
    pub fn end(&self) {
        let _ = self.command_tx.send(HandleCommand::End);
    }

    async fn run_reader(
        mut reader: ReadHalf<BoxedStream>,
        max_frame_size: usize,
        events: mpsc::UnboundedSender<HandleEvent>,
    ) {
        loop {
            match wire::read_frame(&mut reader, max_frame_size).await {
                Ok(Some(frame)) => {
                    trace!(len = frame.len(), text = frame.is_text(), "Frame received");
                    if events.send(HandleEvent::Data(frame)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Stream ended by remote");
                    let _ = events.send(HandleEvent::End);
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "Read failed");
                    let _ = events.send(HandleEvent::Error(e));
                    break;
                }
            }
        }
    }

    async fn run_writer(
        mut writer: WriteHalf<BoxedStream>,
        mut commands: mpsc::UnboundedReceiver<HandleCommand>,
        events: mpsc::UnboundedSender<HandleEvent>,
    ) {
        while let Some(command) = commands.recv().await {
            let result = match command {
                HandleCommand::Text(text) => wire::write_text(&mut writer, &text).await,
                HandleCommand::Vectored(chunks) => wire::write_vectored(&mut writer, &chunks).await,
                HandleCommand::End => {
                    if let Err(e) = writer.shutdown().await {
                        debug!(error = %e, "Shutdown failed");
                    }
                    let _ = events.send(HandleEvent::Ended);
                    return;
                }
            };

            match result {
                Ok(()) => {
                    let _ = events.send(HandleEvent::Written);
                }
                Err(e) => {
                    debug!(error = %e, "Write failed");
                    let _ = events.send(HandleEvent::Error(e));
                    return;
                }
            }
        }
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
