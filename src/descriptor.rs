//! Connection descriptors.
//!
//! A descriptor is everything the socket primitive needs for one connect
//! attempt. It is built from the transport options at `open()` time and
//! handed by value to the connector.
//!
//! # Build Steps
//!
//! 1. Clone the configured query
//! 2. Add the timestamp nonce when `timestampRequests` is on
//! 3. Add `b64=1` when binary frames are not supported
//! 4. Encode, prefixing `?` only when non-empty
//! 5. Copy headers and TLS material verbatim

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashMap;
use url::Url;

use crate::capability::Capabilities;
use crate::config::{TlsMaterial, TransportOptions};
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Query key announcing text-only frames to the server.
pub const BASE64_QUERY_KEY: &str = "b64";

// ============================================================================
// Scheme
// ============================================================================

/// Connection scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Plain TCP.
    Insecure,
    /// TCP wrapped in TLS.
    Secure,
}

impl Scheme {
    /// Returns the protocol string (`"http:"` or `"https:"`).
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insecure => "http:",
            Self::Secure => "https:",
        }
    }

    /// Returns `true` for [`Scheme::Secure`].
    #[inline]
    #[must_use]
    pub const fn is_secure(self) -> bool {
        matches!(self, Self::Secure)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ConnectionDescriptor
// ============================================================================

/// Fully resolved parameters of one connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Connection scheme.
    pub scheme: Scheme,
    /// Remote host.
    pub hostname: String,
    /// Remote port.
    pub port: u16,
    /// Request path including the query string.
    pub path: String,
    /// Extra headers for the upgrade request.
    pub headers: FxHashMap<String, String>,
    /// TLS material.
    pub tls: TlsMaterial,
    /// HTTP proxy to tunnel through.
    pub proxy: Option<String>,
    /// Whether binary frames will be sent.
    pub binary_frames: bool,
}

impl ConnectionDescriptor {
    /// Builds a descriptor using the process-wide nonce generator.
    #[must_use]
    pub fn build(options: &TransportOptions, capabilities: Capabilities) -> Self {
        Self::build_with_nonce(options, capabilities, crate::nonce::yeast)
    }

    /// Builds a descriptor with a caller-supplied nonce source.
    ///
    /// `nonce` is only called when timestamp requests are enabled.
    #[must_use]
    pub fn build_with_nonce(
        options: &TransportOptions,
        capabilities: Capabilities,
        nonce: impl FnOnce() -> String,
    ) -> Self {
        let mut query = options.query.clone();

        if options.timestamp_requests {
            query.set(options.timestamp_param.clone(), nonce());
        }

        if !capabilities.supports_binary() {
            query.set(BASE64_QUERY_KEY, "1");
        }

        let encoded = query.encode();
        let path = if encoded.is_empty() {
            options.path.clone()
        } else {
            format!("{}?{}", options.path, encoded)
        };

        let scheme = if options.secure {
            Scheme::Secure
        } else {
            Scheme::Insecure
        };

        Self {
            scheme,
            hostname: options.hostname.clone(),
            port: options.effective_port(),
            path,
            headers: options.extra_headers.clone(),
            tls: options.tls.clone(),
            proxy: options.proxy.clone(),
            binary_frames: capabilities.supports_binary(),
        }
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }

    /// Returns the query part of the path, without the `?`.
    #[must_use]
    pub fn query(&self) -> &str {
        self.path.split_once('?').map(|(_, q)| q).unwrap_or_default()
    }

    /// Renders the descriptor as a URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host or path do not form a valid URL.
    pub fn url(&self) -> Result<Url> {
        let raw = format!(
            "{}//{}{}",
            self.scheme.as_str(),
            self.authority(),
            self.path
        );
        Url::parse(&raw).map_err(|e| Error::config(format!("invalid endpoint {raw}: {e}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
