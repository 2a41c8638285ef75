//! TLS client setup for secure descriptors.
//!
//! Turns [`TlsMaterial`] into a rustls client configuration. This is the
//! only place where keys, certificates and cipher names are validated.
//!
//! | Material | Effect |
//! |----------|--------|
//! | `ca` | Trusted roots (bundled web roots when empty) |
//! | `cert` + `key` | Client authentication |
//! | `ciphers` | Restricts the provider's cipher suites by name |
//! | `reject_unauthorized = false` | Any server certificate is accepted |
//! | `passphrase` | Unsupported: encrypted keys are rejected |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, ring, verify_tls12_signature, verify_tls13_signature};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

use crate::config::TlsMaterial;
use crate::error::{Error, Result};

// ============================================================================
// Client Configuration
// ============================================================================

/// Builds a client configuration from TLS material.
///
/// # Errors
///
/// - [`Error::Tls`] for unparsable PEM, an encrypted key, a lone certificate
///   or key, or a cipher list matching no supported suite
/// - [`Error::Rustls`] if rustls rejects the resulting configuration
pub fn client_config(material: &TlsMaterial) -> Result<ClientConfig> {
    let provider = Arc::new(provider(material)?);

    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let builder = if material.reject_unauthorized {
        builder.with_root_certificates(root_store(material)?)
    } else {
        warn!("Server certificate verification disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
    };

    let config = match (&material.cert, &material.key) {
        (Some(cert), Some(key)) => {
            let certs = parse_certificates(cert)?;
            let key = parse_private_key(key, material.passphrase.is_some())?;
            builder.with_client_auth_cert(certs, key)?
        }
        (None, None) => builder.with_no_client_auth(),
        _ => {
            return Err(Error::tls(
                "client certificate and key must be provided together",
            ));
        }
    };

    Ok(config)
}

/// Wraps `stream` in a TLS session for `hostname`.
///
/// # Errors
///
/// - [`Error::Tls`] if the configuration or server name is invalid
/// - [`Error::Io`] if the TLS handshake fails
pub async fn connect<S>(stream: S, hostname: &str, material: &TlsMaterial) -> Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let config = client_config(material)?;
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::tls(format!("invalid server name: {hostname}")))?;

    let stream = TlsConnector::from(Arc::new(config))
        .connect(server_name, stream)
        .await?;

    debug!(%hostname, "TLS session established");
    Ok(stream)
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns the ring provider restricted to the configured cipher suites.
fn provider(material: &TlsMaterial) -> Result<CryptoProvider> {
    let mut provider = ring::default_provider();

    let names = material.cipher_names();
    if !names.is_empty() {
        provider.cipher_suites.retain(|suite| {
            let name = format!("{:?}", suite.suite());
            names.iter().any(|wanted| wanted.eq_ignore_ascii_case(&name))
        });

        if provider.cipher_suites.is_empty() {
            return Err(Error::tls(format!(
                "no supported cipher suite in: {}",
                names.join(":")
            )));
        }
    }

    Ok(provider)
}

fn root_store(material: &TlsMaterial) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();

    if material.ca.is_empty() {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        return Ok(roots);
    }

    for pem in &material.ca {
        for cert in parse_certificates(pem)? {
            roots.add(cert)?;
        }
    }

    if roots.is_empty() {
        return Err(Error::tls("CA bundle contains no certificates"));
    }

    Ok(roots)
}

fn parse_certificates(pem: &str) -> Result<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_slice_iter(pem.as_bytes())
        .collect::<StdResult<Vec<_>, _>>()
        .map_err(|e| Error::tls(format!("invalid certificate PEM: {e}")))?;

    if certs.is_empty() {
        return Err(Error::tls("no certificate found in PEM"));
    }

    Ok(certs)
}

fn parse_private_key(pem: &str, has_passphrase: bool) -> Result<PrivateKeyDer<'static>> {
    if pem.contains("ENCRYPTED") {
        return Err(Error::tls(
            "encrypted private keys are not supported; provide a decrypted key",
        ));
    }

    if has_passphrase {
        debug!("Passphrase ignored for unencrypted private key");
    }

    PrivateKeyDer::from_pem_slice(pem.as_bytes())
        .map_err(|e| Error::tls(format!("invalid private key PEM: {e}")))
}

// ============================================================================
// AcceptAnyServerCert
// ============================================================================

/// Verifier used when `reject_unauthorized` is off.
///
/// Certificates are not checked, handshake signatures still are.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> StdResult<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> StdResult<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> StdResult<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

// ============================================================================
// Tests
// ============================================================================
