//! Packet and frame types.
//!
//! # Protocol Overview
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | `Packet` | both | Type tag + optional payload |
//! | `Frame` | both | Serialized packet handed to the socket |
//! | `PacketEncoder` | outbound | Packet → Frame seam |
//!
//! Outbound packets are encoded by the transport. Inbound frames are passed
//! up unchanged; decoding them is the caller's job.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Encoder trait and engine.io codec |
//! | `frame` | Text and binary frames |
//! | `packet` | Packet type tags and payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Encoder trait and engine.io codec.
pub mod codec;

/// Encoded frames.
pub mod frame;

/// Packet types.
pub mod packet;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{EngineIoCodec, PacketEncoder};
pub use frame::Frame;
pub use packet::{Packet, PacketType, Payload};
