//! Packet encoding.
//!
//! The transport calls a [`PacketEncoder`] once per outbound packet with
//! the instance's binary capability. [`EngineIoCodec`] is the default and
//! follows the engine.io v3 single-packet rules:
//!
//! | Payload | Binary supported | Frame |
//! |---------|------------------|-------|
//! | none | any | text `"{type}"` |
//! | text | any | text `"{type}{text}"` |
//! | binary | yes | binary `[type byte]` + payload |
//! | binary | no | text `"b{type}{base64(payload)}"` |
//!
//! Inbound frames are not decoded by the transport. [`EngineIoCodec::decode`]
//! is available to the layer above.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

use super::frame::Frame;
use super::packet::{Packet, PacketType, Payload};

// ============================================================================
// PacketEncoder
// ============================================================================

/// Serializes packets into frames.
pub trait PacketEncoder: Send + Sync {
    /// Encodes one packet.
    ///
    /// # Errors
    ///
    /// Returns an error if the packet cannot be represented.
    fn encode(&self, packet: &Packet, supports_binary: bool) -> Result<Frame>;
}

// ============================================================================
// EngineIoCodec
// ============================================================================

/// Engine.io v3 packet codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineIoCodec;

impl PacketEncoder for EngineIoCodec {
    fn encode(&self, packet: &Packet, supports_binary: bool) -> Result<Frame> {
        let kind = packet.kind;

        let frame = match &packet.data {
            None => Frame::Text(kind.as_char().to_string()),
            Some(Payload::Text(text)) => {
                let mut encoded = String::with_capacity(1 + text.len());
                encoded.push(kind.as_char());
                encoded.push_str(text);
                Frame::Text(encoded)
            }
            Some(Payload::Binary(bytes)) if supports_binary => {
                Frame::Binary(vec![vec![kind.as_u8()], bytes.clone()])
            }
            Some(Payload::Binary(bytes)) => {
                Frame::Text(format!("b{}{}", kind.as_char(), STANDARD.encode(bytes)))
            }
        };

        Ok(frame)
    }
}

impl EngineIoCodec {
    /// Decodes a frame produced by a peer using the same rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for empty frames, unknown type tags and
    /// invalid base64.
    pub fn decode(&self, frame: &Frame) -> Result<Packet> {
        match frame {
            Frame::Text(text) => Self::decode_text(text),
            Frame::Binary(chunks) => {
                let bytes = chunks.concat();
                let (&tag, payload) = bytes
                    .split_first()
                    .ok_or_else(|| Error::protocol("empty binary frame"))?;
                let kind = PacketType::from_u8(tag)
                    .ok_or_else(|| Error::protocol(format!("unknown packet type {tag}")))?;
                Ok(Packet::binary(kind, payload))
            }
        }
    }

    fn decode_text(text: &str) -> Result<Packet> {
        let mut chars = text.chars();
        let first = chars
            .next()
            .ok_or_else(|| Error::protocol("empty text frame"))?;

        if first == 'b' {
            let tag = chars
                .next()
                .ok_or_else(|| Error::protocol("base64 frame without type"))?;
            let kind = Self::parse_tag(tag)?;
            let bytes = STANDARD
                .decode(chars.as_str())
                .map_err(|e| Error::protocol(format!("invalid base64 payload: {e}")))?;
            return Ok(Packet::binary(kind, bytes));
        }

        let kind = Self::parse_tag(first)?;
        let rest = chars.as_str();
        if rest.is_empty() {
            Ok(Packet::new(kind))
        } else {
            Ok(Packet::text(kind, rest))
        }
    }

    fn parse_tag(tag: char) -> Result<PacketType> {
        PacketType::from_char(tag)
            .ok_or_else(|| Error::protocol(format!("unknown packet type '{tag}'")))
    }
}

// ============================================================================
// Tests
// ============================================================================
