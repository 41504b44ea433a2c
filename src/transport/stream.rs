//! Plaintext or TLS byte stream.
//!
//! A tagged variant rather than a trait object: the transport only ever
//! needs these two shapes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::error::{ConnectError, Result};

// ============================================================================
// MaybeTlsStream
// ============================================================================

/// Duplex stream to OBS.
pub enum MaybeTlsStream {
    /// Plain TCP.
    Plain(TcpStream),
    /// TLS over TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl fmt::Debug for MaybeTlsStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) => f.debug_tuple("Plain").field(&s.peer_addr().ok()).finish(),
            Self::Tls(s) => f.debug_tuple("Tls").field(&s.get_ref().0.peer_addr().ok()).finish(),
        }
    }
}

impl MaybeTlsStream {
    /// Dials `address` over TCP.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Refused`] if the socket cannot be opened.
    pub async fn connect_plain(address: &str) -> Result<Self> {
        let tcp = dial(address).await?;
        Ok(Self::Plain(tcp))
    }

    /// Dials `address` and negotiates TLS for `host` using the webpki roots.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::Refused`] if the socket cannot be opened
    /// - [`ConnectError::InvalidHost`] if `host` is not a valid server name
    /// - [`ConnectError::Tls`] if negotiation fails
    pub async fn connect_tls(address: &str, host: &str) -> Result<Self> {
        let server_name = ServerName::try_from(host.to_string()).map_err(|_| {
            ConnectError::InvalidHost {
                host: host.to_string(),
            }
        })?;

        let tcp = dial(address).await?;
        let connector = TlsConnector::from(tls_config()?);
        let tls = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| ConnectError::Tls {
                message: e.to_string(),
            })?;

        debug!(address, "TLS session established");
        Ok(Self::Tls(Box::new(tls)))
    }

    /// Returns `true` for the TLS variant.
    #[inline]
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

async fn dial(address: &str) -> Result<TcpStream> {
    let tcp = TcpStream::connect(address)
        .await
        .map_err(|e| ConnectError::Refused {
            address: address.to_string(),
            message: e.to_string(),
        })?;
    // Small JSON frames; don't wait on Nagle.
    if let Err(e) = tcp.set_nodelay(true) {
        debug!(address, error = %e, "Could not set TCP_NODELAY");
    }
    Ok(tcp)
}

fn tls_config() -> Result<Arc<ClientConfig>> {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| ConnectError::Tls {
        message: e.to_string(),
    })?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(Arc::new(config))
}

// ============================================================================
// AsyncRead / AsyncWrite
// ============================================================================

impl AsyncRead for MaybeTlsStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTlsStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_flush(cx),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
