//! HTTP/1.1 Upgrade handshake.
//!
//! Bootstraps a WebSocket connection over an already-open stream:
//!
//! 1. Generate a random 16-byte `Sec-WebSocket-Key`
//! 2. Send a minimal `GET` upgrade request
//! 3. Read the response head up to `\r\n\r\n`
//! 4. Require status 101 and the exact `Sec-WebSocket-Accept` value
//!
//! The reader is buffered and reads line by line, so any frame OBS sends
//! right after the 101 response stays in the buffer for the frame codec.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::{Error, HandshakeError, Result, TransportError};

// ============================================================================
// Constants
// ============================================================================

/// GUID appended to the key before hashing (RFC 6455 section 1.3).
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Upper bound on the response head.
const MAX_RESPONSE_HEAD: usize = 8 * 1024;

const ACCEPT_HEADER: &str = "sec-websocket-accept";

// ============================================================================
// Key Material
// ============================================================================

/// Generates a base64-encoded random 16-byte key.
#[must_use]
pub fn generate_key() -> String {
    let nonce: [u8; 16] = rand::random();
    STANDARD.encode(nonce)
}

/// Computes `base64(SHA-1(key ++ GUID))`.
#[must_use]
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Builds the upgrade request for `host` (`host:port`).
#[must_use]
pub fn build_request(host: &str, key: &str) -> String {
    format!(
        "GET / HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         \r\n"
    )
}

// ============================================================================
// Handshake
// ============================================================================

/// Performs the client side of the upgrade on `stream`.
///
/// # Errors
///
/// - [`TransportError::Write`] if the request cannot be written
/// - [`HandshakeError::Truncated`] if the stream ends before `\r\n\r\n`
/// - [`HandshakeError::Rejected`] if the status is not 101
/// - [`HandshakeError::InvalidAccept`] if the accept value does not match
pub async fn perform<S>(stream: &mut S, host: &str) -> Result<()>
where
    S: AsyncBufRead + AsyncWrite + Unpin,
{
    let key = generate_key();
    let request = build_request(host, &key);

    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| TransportError::Write {
            message: e.to_string(),
        })?;
    stream.flush().await.map_err(|e| TransportError::Write {
        message: e.to_string(),
    })?;

    trace!(host, "Upgrade request sent");

    let head = read_response_head(stream).await?;
    validate_response(&head, &key)?;

    debug!(host, "WebSocket handshake completed");
    Ok(())
}

/// Reads header lines until the blank line, without consuming past it.
///
/// Returned lines have their `\r\n` stripped; the terminating blank line
/// is not included.
///
/// # Errors
///
/// - [`HandshakeError::Truncated`] on EOF before the blank line
/// - [`HandshakeError::HeaderTooLarge`] past the size limit
pub async fn read_response_head<R>(reader: &mut R) -> Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    let mut total = 0usize;
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 || line.last() != Some(&b'\n') {
            return Err(HandshakeError::Truncated.into());
        }

        total += n;
        if total > MAX_RESPONSE_HEAD {
            return Err(HandshakeError::HeaderTooLarge.into());
        }

        let text = String::from_utf8_lossy(&line);
        let text = text.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            return Ok(lines);
        }
        lines.push(text.to_string());
    }
}

/// Checks the status line and the accept header against `key`.
///
/// # Errors
///
/// - [`HandshakeError::Rejected`] if the status line lacks ` 101 `
/// - [`HandshakeError::InvalidAccept`] on a missing or different accept value
pub fn validate_response(head: &[String], key: &str) -> Result<()> {
    let status_line = head.first().map(String::as_str).unwrap_or_default();
    if !format!("{status_line} ").contains(" 101 ") {
        return Err(HandshakeError::Rejected {
            status_line: status_line.to_string(),
        }
        .into());
    }

    let expected = accept_key(key);
    let received = header_value(head, ACCEPT_HEADER);

    if received != Some(expected.as_str()) {
        return Err(Error::Handshake(HandshakeError::InvalidAccept {
            expected,
            received: received.map(str::to_string),
        }));
    }

    Ok(())
}

/// Finds a header by case-insensitive name and returns its trimmed value.
fn header_value<'a>(head: &'a [String], name: &str) -> Option<&'a str> {
    head.iter().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, BufReader, duplex};

    fn head(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_accept_key_rfc_vector() {
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn test_generate_key_is_16_random_bytes() {
        let key = generate_key();
        let raw = STANDARD.decode(&key).expect("base64");
        assert_eq!(raw.len(), 16);
        assert_ne!(key, generate_key());
    }

    #[test]
    fn test_build_request_headers() {
        let request = build_request("127.0.0.1:4455", "abc==");
        assert!(request.starts_with("GET / HTTP/1.1\r\n"));
        assert!(request.contains("Host: 127.0.0.1:4455\r\n"));
        assert!(request.contains("Upgrade: websocket\r\n"));
        assert!(request.contains("Connection: Upgrade\r\n"));
        assert!(request.contains("Sec-WebSocket-Key: abc==\r\n"));
        assert!(request.contains("Sec-WebSocket-Version: 13\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_validate_accepts_matching_response() {
        let key = "dGhlIHNhbXBsZSBub25jZQ==";
        let response = head(&[
            "HTTP/1.1 101 Switching Protocols",
            "Upgrade: websocket",
            "Connection: Upgrade",
            "sec-websocket-accept:   s3pPLMBiTxaQ9kYGzzhZRbK+xOo=  ",
        ]);
        assert!(validate_response(&response, key).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_101() {
        let response = head(&["HTTP/1.1 400 Bad Request", "Content-Length: 0"]);
        let err = validate_response(&response, "k").expect_err("rejected");
        assert!(matches!(err, Error::Handshake(HandshakeError::Rejected { .. })));
    }

    #[test]
    fn test_validate_rejects_wrong_or_missing_accept() {
        let key = "dGhlIHNhbXBsZSBub25jZQ==";

        let wrong_case = head(&[
            "HTTP/1.1 101 Switching Protocols",
            "Sec-WebSocket-Accept: S3PPLMBITXAQ9KYGZZHZRBK+XOO=",
        ]);
        let err = validate_response(&wrong_case, key).expect_err("case-sensitive");
        assert!(matches!(
            err,
            Error::Handshake(HandshakeError::InvalidAccept { received: Some(_), .. })
        ));

        let missing = head(&["HTTP/1.1 101 Switching Protocols"]);
        let err = validate_response(&missing, key).expect_err("missing");
        assert!(matches!(
            err,
            Error::Handshake(HandshakeError::InvalidAccept { received: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_read_head_leaves_trailing_bytes() {
        let wire = b"HTTP/1.1 101 Switching Protocols\r\nA: b\r\n\r\n\x81\x00".to_vec();
        let mut reader = BufReader::new(wire.as_slice());

        let lines = read_response_head(&mut reader).await.expect("head");
        assert_eq!(lines, head(&["HTTP/1.1 101 Switching Protocols", "A: b"]));

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.expect("rest");
        assert_eq!(rest, vec![0x81, 0x00]);
    }

    #[tokio::test]
    async fn test_read_head_truncated() {
        let wire = b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: web".to_vec();
        let mut reader = BufReader::new(wire.as_slice());
        let err = read_response_head(&mut reader).await.expect_err("truncated");
        assert!(matches!(err, Error::Handshake(HandshakeError::Truncated)));
    }

    #[tokio::test]
    async fn test_read_head_too_large() {
        let mut wire = b"HTTP/1.1 101 Switching Protocols\r\n".to_vec();
        for i in 0..1000 {
            wire.extend_from_slice(format!("X-Filler-{i}: value\r\n").as_bytes());
        }
        let mut reader = BufReader::new(wire.as_slice());
        let err = read_response_head(&mut reader).await.expect_err("too large");
        assert!(matches!(err, Error::Handshake(HandshakeError::HeaderTooLarge)));
    }

    #[tokio::test]
    async fn test_perform_against_scripted_server() {
        let (client, mut server) = duplex(4096);

        let server_task = tokio::spawn(async move {
            let mut server_reader = BufReader::new(&mut server);
            let request = read_response_head(&mut server_reader).await.expect("request");
            let key = request
                .iter()
                .find_map(|l| l.strip_prefix("Sec-WebSocket-Key: "))
                .expect("key header")
                .to_string();

            let response = format!(
                "HTTP/1.1 101 Switching Protocols\r\n\
                 Upgrade: websocket\r\n\
                 Connection: Upgrade\r\n\
                 Sec-WebSocket-Accept: {}\r\n\r\n",
                accept_key(&key)
            );
            server.write_all(response.as_bytes()).await.expect("write");
            request
        });

        let mut stream = BufReader::new(client);
        perform(&mut stream, "obs.local:4455").await.expect("handshake");

        let request = server_task.await.expect("server task");
        assert_eq!(request[0], "GET / HTTP/1.1");
        assert!(request.contains(&"Host: obs.local:4455".to_string()));
    }
}
