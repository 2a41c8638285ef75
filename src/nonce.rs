//! Timestamp nonces for cache busting.
//!
//! A nonce is the current epoch time in milliseconds written in a 64
//! character URL-safe alphabet. Calls landing in the same millisecond get a
//! `.`-separated counter suffix, so consecutive nonces never repeat.

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

// ============================================================================
// Constants
// ============================================================================

const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Process-wide generator used by [`yeast`].
static GLOBAL: Mutex<Yeast> = Mutex::new(Yeast::new());

// ============================================================================
// Encoding
// ============================================================================

/// Encodes `num` in the nonce alphabet.
#[must_use]
pub fn encode(mut num: u64) -> String {
    let mut digits = Vec::new();

    loop {
        digits.push(ALPHABET[(num % 64) as usize]);
        num /= 64;
        if num == 0 {
            break;
        }
    }

    digits.reverse();
    // Every byte comes from the ASCII alphabet.
    digits.into_iter().map(char::from).collect()
}

/// Decodes a string produced by [`encode`].
///
/// Returns `None` on characters outside the alphabet or overflow.
#[must_use]
pub fn decode(encoded: &str) -> Option<u64> {
    encoded.bytes().try_fold(0u64, |acc, byte| {
        let digit = ALPHABET.iter().position(|&c| c == byte)? as u64;
        acc.checked_mul(64)?.checked_add(digit)
    })
}

// ============================================================================
// Yeast
// ============================================================================

/// Nonce generator with same-millisecond disambiguation.
#[derive(Debug)]
pub struct Yeast {
    previous: Option<String>,
    seed: u64,
}

impl Yeast {
    /// Creates a generator with no history.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: None,
            seed: 0,
        }
    }

    /// Returns a nonce for the current time.
    pub fn generate(&mut self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.next_at(millis)
    }

    /// Returns a nonce for `millis` since the epoch.
    pub fn next_at(&mut self, millis: u64) -> String {
        let now = encode(millis);

        if self.previous.as_deref() != Some(now.as_str()) {
            self.seed = 0;
            self.previous = Some(now.clone());
            return now;
        }

        let suffix = encode(self.seed);
        self.seed += 1;
        format!("{now}.{suffix}")
    }
}

impl Default for Yeast {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a process-wide unique timestamp nonce.
#[must_use]
pub fn yeast() -> String {
    GLOBAL.lock().generate()
}

// ============================================================================
// Tests
// ============================================================================
