//! Write-side backpressure.
//!
//! Tracks whether a new batch may be written and decides when a `Drain`
//! event is due.

// ============================================================================
// Imports
// ============================================================================

use crate::config::DrainPolicy;

// ============================================================================
// DrainController
// ============================================================================

/// Writable flag plus outstanding frame count.
#[derive(Debug, Clone)]
pub(crate) struct DrainController {
    policy: DrainPolicy,
    writable: bool,
    outstanding: usize,
}

impl DrainController {
    /// Creates a writable controller.
    pub(crate) const fn new(policy: DrainPolicy) -> Self {
        Self {
            policy,
            writable: true,
            outstanding: 0,
        }
    }

    /// Returns `true` if a new batch may be accepted.
    #[inline]
    pub(crate) const fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns the number of submitted frames not yet written.
    #[inline]
    pub(crate) const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Accepts a batch of `frames` frames.
    ///
    /// Returns `false` for an empty batch, which leaves the controller
    /// writable and should be answered with an immediate `Drain`.
    pub(crate) fn begin_batch(&mut self, frames: usize) -> bool {
        if frames == 0 {
            return false;
        }

        self.writable = false;
        self.outstanding += frames;
        true
    }

    /// Records one written frame. Returns `true` if `Drain` should fire.
    pub(crate) fn frame_written(&mut self) -> bool {
        self.outstanding = self.outstanding.saturating_sub(1);

        match self.policy {
            DrainPolicy::PerFrame => {
                self.writable = true;
                true
            }
            DrainPolicy::PerBatch if self.outstanding == 0 => {
                self.writable = true;
                true
            }
            DrainPolicy::PerBatch => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
