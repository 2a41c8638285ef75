//! Transport configuration.
//!
//! Provides a type-safe interface for everything the transport needs to
//! build a connection descriptor: endpoint, query parameters, headers,
//! TLS material and write-side behaviour.
//!
//! # Example
//!
//! ```ignore
//! use eio_tcp_transport::TransportOptions;
//!
//! let options = TransportOptions::new("chat.example.com")
//!     .with_port(4000)
//!     .with_secure()
//!     .with_query("EIO", "3")
//!     .with_timestamp_requests()
//!     .with_header("Authorization", "Bearer abc");
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::socket::handshake::{
    is_valid_header_name, is_valid_header_value, is_valid_request_target,
};

use super::query::Query;
use super::tls::TlsMaterial;

// ============================================================================
// Constants
// ============================================================================

/// Default base path of the realtime endpoint.
pub const DEFAULT_PATH: &str = "/engine.io/";

/// Default query key for the anti-caching timestamp.
pub const DEFAULT_TIMESTAMP_PARAM: &str = "t";

/// Default maximum size of one inbound frame (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1_048_576;

// ============================================================================
// DrainPolicy
// ============================================================================

/// When the transport reports that it can accept the next write batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrainPolicy {
    /// One `Drain` once every frame of the batch has been written.
    #[default]
    PerBatch,
    /// One `Drain` per written frame.
    PerFrame,
}

// ============================================================================
// TransportOptions
// ============================================================================

/// Configuration of a single TCP transport instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportOptions {
    /// Remote host name or address.
    pub hostname: String,

    /// Remote port. `None` selects 443 for secure and 80 otherwise.
    pub port: Option<u16>,

    /// Use TLS.
    pub secure: bool,

    /// Base path of the endpoint, sent in the upgrade request.
    pub path: String,

    /// Query parameters appended to the path.
    pub query: Query,

    /// Append a unique timestamp parameter to every connect.
    pub timestamp_requests: bool,

    /// Query key used for the timestamp parameter.
    pub timestamp_param: String,

    /// Force text frames with base64 encoded binary payloads.
    pub force_base64: bool,

    /// Extra headers sent with the upgrade request.
    pub extra_headers: FxHashMap<String, String>,

    /// TLS material for secure connections.
    pub tls: TlsMaterial,

    /// HTTP proxy (`host:port`) to tunnel through.
    pub proxy: Option<String>,

    /// Drain signalling policy.
    pub drain_policy: DrainPolicy,

    /// Maximum accepted inbound frame size in bytes.
    pub max_frame_size: usize,
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportOptions {
    /// Creates options for `hostname` with default settings.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Parses options from a JSON document with camelCase keys.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if the parsed options are invalid
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: None,
            secure: false,
            path: DEFAULT_PATH.to_string(),
            query: Query::new(),
            timestamp_requests: false,
            timestamp_param: DEFAULT_TIMESTAMP_PARAM.to_string(),
            force_base64: false,
            extra_headers: FxHashMap::default(),
            tls: TlsMaterial::new(),
            proxy: None,
            drain_policy: DrainPolicy::PerBatch,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportOptions {
    /// Sets the remote port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enables TLS.
    #[inline]
    #[must_use]
    pub fn with_secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Sets the base path.
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds a query parameter.
    #[inline]
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.set(key, value);
        self
    }

    /// Enables the anti-caching timestamp parameter.
    #[inline]
    #[must_use]
    pub fn with_timestamp_requests(mut self) -> Self {
        self.timestamp_requests = true;
        self
    }

    /// Sets the timestamp parameter key.
    #[inline]
    #[must_use]
    pub fn with_timestamp_param(mut self, param: impl Into<String>) -> Self {
        self.timestamp_param = param.into();
        self
    }

    /// Forces text frames for every packet.
    #[inline]
    #[must_use]
    pub fn with_force_base64(mut self) -> Self {
        self.force_base64 = true;
        self
    }

    /// Adds an extra header to the upgrade request.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Replaces the TLS material.
    #[inline]
    #[must_use]
    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = tls;
        self
    }

    /// Tunnels the connection through an HTTP proxy.
    #[inline]
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Sets the drain signalling policy.
    #[inline]
    #[must_use]
    pub fn with_drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.drain_policy = policy;
        self
    }

    /// Sets the maximum inbound frame size.
    #[inline]
    #[must_use]
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl TransportOptions {
    /// Returns the port that will be dialled.
    #[inline]
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        match (self.port, self.secure) {
            (Some(port), _) => port,
            (None, true) => 443,
            (None, false) => 80,
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::config("hostname must not be empty"));
        }

        if !is_valid_request_target(&self.hostname) {
            return Err(Error::config(format!(
                "hostname contains whitespace or control characters: {:?}",
                self.hostname
            )));
        }

        if !self.path.starts_with('/') {
            return Err(Error::config(format!(
                "path must start with '/': {}",
                self.path
            )));
        }

        if !is_valid_request_target(&self.path) {
            return Err(Error::config(format!(
                "path contains whitespace or control characters: {:?}",
                self.path
            )));
        }

        for (name, value) in &self.extra_headers {
            if !is_valid_header_name(name) {
                return Err(Error::config(format!("invalid header name: {name:?}")));
            }
            if !is_valid_header_value(value) {
                return Err(Error::config(format!(
                    "header {name} contains CR, LF or NUL"
                )));
            }
        }

        if self.timestamp_requests && self.timestamp_param.is_empty() {
            return Err(Error::config(
                "timestampParam must not be empty when timestampRequests is enabled",
            ));
        }

        if self.max_frame_size == 0 {
            return Err(Error::config("maxFrameSize must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
