//! Encoded frames.

// ============================================================================
// Frame
// ============================================================================

/// A serialized packet, ready for the socket.
///
/// Text frames go through the socket's text write, binary frames through
/// its vectored write. Binary frames are kept as chunks so the encoder can
/// emit the type byte and the payload without copying them together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame.
    Text(String),
    /// Binary frame as a list of chunks.
    Binary(Vec<Vec<u8>>),
}

impl Frame {
    /// Creates a binary frame from a single chunk.
    #[inline]
    #[must_use]
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary(vec![bytes.into()])
    }

    /// Returns `true` for text frames.
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the text of a text frame.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Returns the total payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(chunks) => chunks.iter().map(Vec::len).sum(),
        }
    }

    /// Returns `true` if the frame carries no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the payload as one contiguous buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.as_bytes().to_vec(),
            Self::Binary(chunks) => chunks.concat(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
