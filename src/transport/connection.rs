//! WebSocket connection to OBS.
//!
//! Owns the duplex stream and exposes message-level primitives to the
//! session layer.
//!
//! # Behaviour
//!
//! - `connect` dials (TCP or TLS) and runs the upgrade handshake
//! - `send_text` writes one unfragmented, masked text frame
//! - `receive_message` answers pings, skips pongs and returns the next
//!   text/binary frame parsed as a JSON object
//! - A close frame or EOF is reported as `ConnectionClosed`
//! - Every blocking step is bounded by the configured timeout
//!
//! There is no background task: reads only happen while a caller awaits.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::config::ConnectionParameters;
use crate::error::{Error, Result, TransportError};
use crate::protocol::ProtocolMessage;

use super::frame::{self, OpCode};
use super::handshake;
use super::stream::MaybeTlsStream;

// ============================================================================
// Transport
// ============================================================================

/// An open WebSocket to OBS.
///
/// Dropping a `Transport` closes the socket; [`Transport::close`] does so
/// explicitly and may be called any number of times.
#[derive(Debug)]
pub struct Transport {
    /// Buffered stream; `None` once closed.
    stream: Option<BufReader<MaybeTlsStream>>,
    /// `host:port`, for logging.
    address: String,
    /// Bound for each blocking step.
    timeout: Duration,
}

impl Transport {
    /// Opens the stream and performs the WebSocket handshake.
    ///
    /// # Errors
    ///
    /// - [`crate::ConnectError`] if the socket or TLS session cannot be opened
    /// - [`crate::HandshakeError`] if the upgrade fails
    /// - [`TransportError::Timeout`] if either step exceeds the timeout
    pub async fn connect(params: &ConnectionParameters) -> Result<Self> {
        let address = params.address();
        let limit = params.timeout;

        debug!(%address, tls = params.use_tls, "Connecting to OBS");

        let stream = timeout(limit, async {
            if params.use_tls {
                MaybeTlsStream::connect_tls(&address, &params.host).await
            } else {
                MaybeTlsStream::connect_plain(&address).await
            }
        })
        .await
        .map_err(|_| Error::timeout("connect", params.timeout_ms()))??;

        debug!(%address, tls = stream.is_tls(), "Stream open, upgrading");
        let mut stream = BufReader::new(stream);

        timeout(limit, handshake::perform(&mut stream, &address))
            .await
            .map_err(|_| Error::timeout("handshake", params.timeout_ms()))??;

        Ok(Self {
            stream: Some(stream),
            address,
            timeout: limit,
        })
    }

    /// Returns the configured timeout.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `true` until [`Transport::close`] is called.
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Sends `text` as a single masked text frame.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Write`] if the stream errors
    /// - [`TransportError::Timeout`] if the write stalls
    /// - [`crate::ProtocolError::ConnectionClosed`] if already closed
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        let limit = self.timeout;
        let stream = self.stream_mut()?;
        let wire = frame::encode(OpCode::Text, text.as_bytes());

        trace!(len = text.len(), "Sending text frame");

        timeout(limit, write_frame(stream, &wire))
            .await
            .map_err(|_| Error::timeout("send", duration_ms(limit)))?
    }

    /// Receives the next application message.
    ///
    /// # Errors
    ///
    /// - [`crate::ProtocolError::Malformed`] if the payload is not a JSON object
    /// - [`crate::ProtocolError::ConnectionClosed`] on close frame or EOF
    /// - [`TransportError::Truncated`] on a partial frame
    /// - [`TransportError::Timeout`] if nothing arrives in time
    pub async fn receive_message(&mut self) -> Result<ProtocolMessage> {
        let limit = self.timeout;
        timeout(limit, self.read_message())
            .await
            .map_err(|_| Error::timeout("receive", duration_ms(limit)))?
    }

    /// Receives the next application message without a timeout.
    ///
    /// Callers wrap a sequence of these in their own deadline.
    pub(crate) async fn read_message(&mut self) -> Result<ProtocolMessage> {
        let stream = self.stream_mut()?;

        loop {
            let Some(frame) = frame::read_frame(stream).await? else {
                debug!("Stream ended");
                return Err(Error::connection_closed(None));
            };

            trace!(opcode = ?frame.opcode, len = frame.payload.len(), "Frame received");

            if frame.opcode.is_control() {
                match frame.opcode {
                    OpCode::Ping => {
                        let pong = frame::encode(OpCode::Pong, &frame.payload);
                        write_frame(stream, &pong).await?;
                        trace!("Answered ping");
                    }
                    OpCode::Close => {
                        let code = frame.close_code();
                        debug!(?code, "Close frame received");
                        return Err(Error::connection_closed(code));
                    }
                    _ => trace!("Ignoring pong"),
                }
                continue;
            }

            if !frame.fin || frame.opcode == OpCode::Continuation {
                warn!(opcode = ?frame.opcode, fin = frame.fin, "Fragmented message received");
                return Err(Error::malformed("fragmented messages are not supported"));
            }

            return ProtocolMessage::from_slice(&frame.payload);
        }
    }

    /// Closes the stream. Sends no WebSocket frames.
    ///
    /// Idempotent; errors during shutdown are ignored.
    pub async fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        if timeout(self.timeout, stream.shutdown()).await.is_err() {
            debug!(address = %self.address, "Shutdown timed out");
        }

        debug!(address = %self.address, "Connection closed");
    }

    fn stream_mut(&mut self) -> Result<&mut BufReader<MaybeTlsStream>> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::connection_closed(None))
    }
}

/// Writes a whole frame and flushes it.
async fn write_frame<W>(writer: &mut W, wire: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let write_err = |e: std::io::Error| TransportError::Write {
        message: e.to_string(),
    };

    writer.write_all(wire).await.map_err(write_err)?;
    writer.flush().await.map_err(write_err)?;
    Ok(())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
