//! Binary-frame capability negotiation.
//!
//! Decided once when a transport is constructed. The value is immutable:
//! binary support can be switched off by building a new value, never
//! switched back on.

// ============================================================================
// Imports
// ============================================================================

use crate::config::TransportOptions;

// ============================================================================
// Capabilities
// ============================================================================

/// Frame encoding capabilities of one transport instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    supports_binary: bool,
    force_base64: bool,
}

impl Capabilities {
    /// Binary frames enabled.
    #[inline]
    #[must_use]
    pub const fn binary() -> Self {
        Self {
            supports_binary: true,
            force_base64: false,
        }
    }

    /// Text frames only, for a peer discovered to lack binary support.
    #[inline]
    #[must_use]
    pub const fn text_only() -> Self {
        Self {
            supports_binary: false,
            force_base64: false,
        }
    }

    /// Negotiates capabilities from configuration.
    ///
    /// `forceBase64` latches binary support off.
    #[inline]
    #[must_use]
    pub const fn from_options(options: &TransportOptions) -> Self {
        if options.force_base64 {
            Self {
                supports_binary: false,
                force_base64: true,
            }
        } else {
            Self::binary()
        }
    }

    /// Returns a copy with binary support disabled.
    #[inline]
    #[must_use]
    pub const fn without_binary(self) -> Self {
        Self {
            supports_binary: false,
            force_base64: self.force_base64,
        }
    }

    /// Returns `true` if binary frames may be sent.
    #[inline]
    #[must_use]
    pub const fn supports_binary(&self) -> bool {
        self.supports_binary
    }

    /// Returns `true` if configuration forced base64 text frames.
    #[inline]
    #[must_use]
    pub const fn force_base64(&self) -> bool {
        self.force_base64
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::binary()
    }
}

// ============================================================================
// Tests
// ============================================================================
