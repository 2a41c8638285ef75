//! TLS material carried from configuration into the connection descriptor.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

// ============================================================================
// TlsMaterial
// ============================================================================

/// Security material for secure connections.
///
/// Copied verbatim into the descriptor. Nothing here is validated until
/// the socket primitive builds its TLS client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TlsMaterial {
    /// PEM private key for client authentication.
    pub key: Option<String>,

    /// PEM certificate chain for client authentication.
    pub cert: Option<String>,

    /// Passphrase for an encrypted private key.
    pub passphrase: Option<String>,

    /// PEM certificate authority bundle. Empty means the bundled web roots.
    pub ca: Vec<String>,

    /// Cipher suite names separated by `:` or `,`.
    pub ciphers: Option<String>,

    /// Reject servers whose certificate does not verify.
    pub reject_unauthorized: bool,
}

impl TlsMaterial {
    /// Creates empty material that verifies server certificates.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            key: None,
            cert: None,
            passphrase: None,
            ca: Vec::new(),
            ciphers: None,
            reject_unauthorized: true,
        }
    }

    /// Returns `true` if a client certificate and key are both present.
    #[inline]
    #[must_use]
    pub fn has_client_identity(&self) -> bool {
        self.key.is_some() && self.cert.is_some()
    }

    /// Returns the configured cipher suite names, if any.
    #[must_use]
    pub fn cipher_names(&self) -> Vec<&str> {
        self.ciphers
            .as_deref()
            .map(|list| {
                list.split([':', ','])
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for TlsMaterial {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rejects_unauthorized() {
        let tls = TlsMaterial::default();
        assert!(tls.reject_unauthorized);
        assert!(!tls.has_client_identity());
    }

    #[test]
    fn test_cipher_names_split() {
        let tls = TlsMaterial {
            ciphers: Some("TLS13_AES_128_GCM_SHA256: TLS13_CHACHA20_POLY1305_SHA256,".into()),
            ..TlsMaterial::new()
        };
        assert_eq!(
            tls.cipher_names(),
            vec!["TLS13_AES_128_GCM_SHA256", "TLS13_CHACHA20_POLY1305_SHA256"]
        );
    }

    #[test]
    fn test_deserialize_camel_case() {
        let tls: TlsMaterial =
            serde_json::from_str(r#"{"rejectUnauthorized": false, "ca": ["pem"]}"#)
                .expect("parse");
        assert!(!tls.reject_unauthorized);
        assert_eq!(tls.ca, vec!["pem".to_string()]);
    }
}
