//! Transport configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TransportOptions`] | Endpoint, query, headers and write behaviour |
//! | [`Query`] | Ordered query parameters |
//! | [`TlsMaterial`] | Keys, certificates and verification settings |
//! | [`DrainPolicy`] | Per-batch or per-frame drain signalling |

// ============================================================================
// Submodules
// ============================================================================

/// Transport options and builder methods.
pub mod options;

/// Ordered query parameters.
pub mod query;

/// TLS material.
pub mod tls;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::{DrainPolicy, TransportOptions};
pub use query::Query;
pub use tls::TlsMaterial;
