//! Upgrade handshake and proxy tunnelling.
//!
//! Before frames flow, the client sends an HTTP/1.1 upgrade request carrying
//! the descriptor's path, query and headers. The server must answer `101`.
//! Through a proxy, an HTTP `CONNECT` tunnel is opened first.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Write as _;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Value of the `Upgrade` header.
pub const UPGRADE_PROTOCOL: &str = "tcp-packets";

/// Maximum size of a response head.
const MAX_HEAD_SIZE: usize = 16 * 1024;

// ============================================================================
// Upgrade
// ============================================================================

/// Renders the upgrade request for `descriptor`.
///
/// Extra headers are emitted sorted by name. A user supplied `Host` header
/// replaces the generated one.
///
/// # Errors
///
/// Returns [`Error::Handshake`] if the path, host or a header would break
/// the request framing.
pub fn upgrade_request(descriptor: &ConnectionDescriptor) -> Result<String> {
    if !is_valid_request_target(&descriptor.path) {
        return Err(Error::handshake(format!(
            "invalid request path: {:?}",
            descriptor.path
        )));
    }

    let authority = descriptor.authority();
    if !is_valid_request_target(&authority) {
        return Err(Error::handshake(format!("invalid host: {authority:?}")));
    }

    let mut request = format!("GET {} HTTP/1.1\r\n", descriptor.path);

    let has_host = descriptor
        .headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case("host"));
    if !has_host {
        let _ = write!(request, "Host: {authority}\r\n");
    }

    let mut headers: Vec<_> = descriptor.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        if !is_valid_header_name(name) {
            return Err(Error::handshake(format!("invalid header name: {name:?}")));
        }
        if !is_valid_header_value(value) {
            return Err(Error::handshake(format!(
                "invalid value for header {name}"
            )));
        }
        let _ = write!(request, "{name}: {value}\r\n");
    }

    let _ = write!(
        request,
        "Connection: Upgrade\r\nUpgrade: {UPGRADE_PROTOCOL}\r\n\r\n"
    );
    Ok(request)
}

/// Performs the upgrade handshake on an established stream.
///
/// # Errors
///
/// - [`Error::HandshakeRejected`] if the status is not `101`
/// - [`Error::Handshake`] if the request cannot be rendered or the response
///   is malformed or truncated
pub async fn upgrade<S>(stream: &mut S, descriptor: &ConnectionDescriptor) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = upgrade_request(descriptor)?;
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let head = read_head(stream).await?;
    let status = parse_status(&head)?;
    if status != 101 {
        return Err(Error::HandshakeRejected { status });
    }

    debug!(path = %descriptor.path, "Upgrade handshake completed");
    Ok(())
}

// ============================================================================
// Proxy Tunnel
// ============================================================================

/// Opens an HTTP `CONNECT` tunnel to `authority` through a proxy stream.
///
/// # Errors
///
/// - [`Error::ProxyRejected`] if the proxy answers with a non-2xx status
/// - [`Error::Handshake`] if `authority` is not a plain `host:port` or the
///   response is malformed or truncated
pub async fn tunnel<S>(stream: &mut S, authority: &str) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !is_valid_request_target(authority) {
        return Err(Error::handshake(format!("invalid tunnel target: {authority:?}")));
    }

    let request = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    let head = read_head(stream).await?;
    let status = parse_status(&head)?;
    if !(200..300).contains(&status) {
        return Err(Error::ProxyRejected { status });
    }

    debug!(%authority, "Proxy tunnel established");
    Ok(())
}

// ============================================================================
// Field Checks
// ============================================================================

/// Returns `true` if `target` can sit in a request line: non-empty, no
/// whitespace, no control characters.
pub(crate) fn is_valid_request_target(target: &str) -> bool {
    !target.is_empty()
        && !target
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
}

/// Returns `true` for a non-empty header name without separators or
/// control characters.
pub(crate) fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c == ':' || c.is_whitespace() || c.is_control())
}

/// Returns `true` if `value` contains no CR, LF or NUL.
pub(crate) fn is_valid_header_value(value: &str) -> bool {
    !value.contains(['\r', '\n', '\0'])
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Reads a response head up to and including the blank line.
///
/// Reads byte by byte so no frame data after the head is consumed.
async fn read_head<S>(stream: &mut S) -> Result<String>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(256);

    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_HEAD_SIZE {
            return Err(Error::handshake(format!(
                "response head exceeds {MAX_HEAD_SIZE} bytes"
            )));
        }

        let mut byte = [0u8; 1];
        let read = stream.read(&mut byte).await?;
        if read == 0 {
            return Err(Error::handshake("connection closed during handshake"));
        }
        head.push(byte[0]);
    }

    String::from_utf8(head).map_err(|_| Error::handshake("response head is not UTF-8"))
}

/// Extracts the status code from `HTTP/1.x <code> <reason>`.
fn parse_status(head: &str) -> Result<u16> {
    let status_line = head.lines().next().unwrap_or_default();
    let mut parts = status_line.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/1.") => code
            .parse()
            .map_err(|_| Error::handshake(format!("invalid status line: {status_line}"))),
        _ => Err(Error::handshake(format!(
            "invalid status line: {status_line}"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
