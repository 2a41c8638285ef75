//! Wire format for frames after the upgrade handshake.
//!
//! Frames are kind-tagged and length-prefixed:
//! `[1 byte kind][4 bytes big-endian u32 length][payload]`.
//!
//! | Kind | Payload |
//! |------|---------|
//! | `0` | UTF-8 text |
//! | `1` | binary |

// ============================================================================
// Imports
// ============================================================================

use std::io::{ErrorKind, IoSlice};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::protocol::Frame;

// ============================================================================
// Constants
// ============================================================================

/// Kind byte of a text frame.
pub const TEXT_KIND: u8 = 0;

/// Kind byte of a binary frame.
pub const BINARY_KIND: u8 = 1;

/// Size of the kind + length header.
pub const HEADER_LEN: usize = 5;

// ============================================================================
// Reading
// ============================================================================

/// Reads one frame.
///
/// Returns `Ok(None)` when the peer closed the stream on a frame boundary.
///
/// # Errors
///
/// - [`Error::FrameTooLarge`] if the announced length exceeds `max_size`
/// - [`Error::Protocol`] for an unknown kind or non-UTF-8 text
/// - [`Error::Io`] if the stream fails or ends inside a frame
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let kind = match reader.read_u8().await {
        Ok(kind) => kind,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };

    let len = reader.read_u32().await? as usize;
    if len > max_size {
        return Err(Error::frame_too_large(len, max_size));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    match kind {
        TEXT_KIND => String::from_utf8(payload)
            .map(|text| Some(Frame::Text(text)))
            .map_err(|e| Error::protocol(format!("text frame is not UTF-8: {e}"))),
        BINARY_KIND => Ok(Some(Frame::binary(payload))),
        other => Err(Error::protocol(format!("unknown frame kind {other}"))),
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Writes a text frame.
pub async fn write_text<W>(writer: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_chunks(writer, TEXT_KIND, &[text.as_bytes()]).await
}

/// Writes a binary frame from chunks with a single vectored write loop.
pub async fn write_vectored<W>(writer: &mut W, chunks: &[Vec<u8>]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let chunks: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
    write_chunks(writer, BINARY_KIND, &chunks).await
}

async fn write_chunks<W>(writer: &mut W, kind: u8, chunks: &[&[u8]]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total: usize = chunks.iter().map(|c| c.len()).sum();
    let len = u32::try_from(total)
        .map_err(|_| Error::protocol(format!("frame of {total} bytes cannot be encoded")))?;

    let mut header = [0u8; HEADER_LEN];
    header[0] = kind;
    header[1..].copy_from_slice(&len.to_be_bytes());

    let mut slices: Vec<IoSlice<'_>> = Vec::with_capacity(1 + chunks.len());
    slices.push(IoSlice::new(&header));
    slices.extend(chunks.iter().map(|c| IoSlice::new(c)));

    let mut remaining = &mut slices[..];
    while !remaining.is_empty() {
        let written = writer.write_vectored(remaining).await?;
        if written == 0 {
            return Err(Error::Io(ErrorKind::WriteZero.into()));
        }
        IoSlice::advance_slices(&mut remaining, written);
    }

    writer.flush().await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
