//! Application packets.
//!
//! A packet is a type tag plus an optional text or binary payload. The
//! transport never looks inside a payload; it only hands packets to the
//! encoder.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// PacketType
// ============================================================================

/// Packet type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Handshake data from the server.
    Open = 0,
    /// Request to close the session.
    Close = 1,
    /// Heartbeat probe.
    Ping = 2,
    /// Heartbeat answer.
    Pong = 3,
    /// Application message.
    Message = 4,
    /// Transport upgrade confirmation.
    Upgrade = 5,
    /// No operation.
    Noop = 6,
}

impl PacketType {
    /// Returns the numeric tag.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parses a numeric tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Open),
            1 => Some(Self::Close),
            2 => Some(Self::Ping),
            3 => Some(Self::Pong),
            4 => Some(Self::Message),
            5 => Some(Self::Upgrade),
            6 => Some(Self::Noop),
            _ => None,
        }
    }

    /// Returns the tag as an ASCII digit.
    #[inline]
    #[must_use]
    pub const fn as_char(self) -> char {
        (b'0' + self as u8) as char
    }

    /// Parses an ASCII digit tag.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(10).and_then(|d| Self::from_u8(d as u8))
    }

    /// Returns the lowercase packet name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Message => "message",
            Self::Upgrade => "upgrade",
            Self::Noop => "noop",
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Packet payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Binary(Vec<u8>),
}

// ============================================================================
// Packet
// ============================================================================

/// An outbound or decoded inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Type tag.
    pub kind: PacketType,
    /// Optional payload.
    pub data: Option<Payload>,
}

impl Packet {
    /// Creates a packet without payload.
    #[inline]
    #[must_use]
    pub const fn new(kind: PacketType) -> Self {
        Self { kind, data: None }
    }

    /// Creates a packet with a text payload.
    #[inline]
    #[must_use]
    pub fn text(kind: PacketType, text: impl Into<String>) -> Self {
        Self {
            kind,
            data: Some(Payload::Text(text.into())),
        }
    }

    /// Creates a packet with a binary payload.
    #[inline]
    #[must_use]
    pub fn binary(kind: PacketType, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            data: Some(Payload::Binary(bytes.into())),
        }
    }

    /// Creates a text message packet.
    #[inline]
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::text(PacketType::Message, text)
    }

    /// Creates a binary message packet.
    #[inline]
    #[must_use]
    pub fn binary_message(bytes: impl Into<Vec<u8>>) -> Self {
        Self::binary(PacketType::Message, bytes)
    }

    /// Creates a ping packet.
    #[inline]
    #[must_use]
    pub const fn ping() -> Self {
        Self::new(PacketType::Ping)
    }

    /// Creates a close packet.
    #[inline]
    #[must_use]
    pub const fn close() -> Self {
        Self::new(PacketType::Close)
    }

    /// Returns `true` if the payload is binary.
    #[inline]
    #[must_use]
    pub fn is_binary(&self) -> bool {
        matches!(self.data, Some(Payload::Binary(_)))
    }
}

// ============================================================================
// Tests
// ============================================================================
