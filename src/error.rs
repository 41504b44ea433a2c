//! Error types for the OBS remote client.
//!
//! This module defines all error types used throughout the crate.
//! Every error is terminal for the current operation: nothing is retried
//! internally and the session is always closed.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use obs_remote::{ObsSession, Result};
//!
//! async fn example(session: &mut ObsSession) -> Result<()> {
//!     session.connect().await?;
//!     session.set_current_scene("Intro").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Type |
//! |----------|------|
//! | Socket / TLS | [`ConnectError`] |
//! | HTTP upgrade | [`HandshakeError`] |
//! | obs-websocket protocol | [`ProtocolError`] |
//! | Request rejected by OBS | [`Error::Obs`] |
//! | Framing / I/O / timeout | [`TransportError`] |
//! | Configuration | [`Error::Config`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::session::SessionState;

// ============================================================================
// Constants
// ============================================================================

/// Message used when OBS rejects a request without a comment.
pub const GENERIC_OBS_FAILURE: &str = "OBS request failed";

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Socket or TLS stream could not be opened.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// HTTP upgrade rejected or malformed.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// obs-websocket protocol violation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Framing, write or timeout failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Request reached OBS but OBS reported failure.
    ///
    /// Displays exactly the server-supplied comment.
    #[error("{comment}")]
    Obs {
        /// Human-readable comment from `requestStatus.comment`.
        comment: String,
    },

    /// Invalid connection parameters or operation arguments.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// ConnectError
// ============================================================================

/// Failure to open the underlying stream.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// TCP connection refused or unreachable.
    #[error("Cannot connect to OBS at {address}: {message}")]
    Refused {
        /// `host:port` that was dialed.
        address: String,
        /// Underlying socket error.
        message: String,
    },

    /// Host cannot be used as a TLS server name.
    #[error("Invalid host for TLS: {host}")]
    InvalidHost {
        /// The rejected host.
        host: String,
    },

    /// TLS negotiation failed.
    #[error("TLS error: {message}")]
    Tls {
        /// Description of the TLS failure.
        message: String,
    },
}

// ============================================================================
// HandshakeError
// ============================================================================

/// Failure during the HTTP/1.1 Upgrade exchange.
#[derive(Error, Debug)]
pub enum HandshakeError {
    /// Stream ended before the header terminator.
    #[error("WebSocket handshake truncated")]
    Truncated,

    /// Server answered with a status other than 101.
    #[error("WebSocket handshake rejected: {status_line}")]
    Rejected {
        /// The server's status line.
        status_line: String,
    },

    /// `Sec-WebSocket-Accept` missing or wrong.
    #[error("Invalid Sec-WebSocket-Accept: expected {expected}, got {received:?}")]
    InvalidAccept {
        /// Value computed from our key.
        expected: String,
        /// Value sent by the server, if any.
        received: Option<String>,
    },

    /// Response headers exceeded the size limit.
    #[error("WebSocket handshake response too large")]
    HeaderTooLarge,
}

// ============================================================================
// ProtocolError
// ============================================================================

/// obs-websocket protocol violation.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload is not a JSON object or a frame is unusable.
    #[error("Malformed message: {message}")]
    Malformed {
        /// What was wrong with the message.
        message: String,
    },

    /// Close frame or end of stream.
    #[error("Connection closed by OBS (code {code:?})")]
    ConnectionClosed {
        /// Close status code, when the close frame carried one.
        code: Option<u16>,
    },

    /// A message with an unexpected `op` arrived during the identify handshake.
    #[error("Unexpected message op {op:?}")]
    UnexpectedMessage {
        /// The received op code, if present.
        op: Option<u64>,
    },

    /// OBS did not answer Identify with Identified.
    #[error("Not authorized by OBS: {reason}")]
    NotAuthorized {
        /// Why identification failed.
        reason: String,
    },

    /// A request was attempted before the session was identified.
    #[error("Session not identified (state: {state:?})")]
    NotIdentified {
        /// State the session was in.
        state: SessionState,
    },
}

// ============================================================================
// TransportError
// ============================================================================

/// Failure in the framing or I/O layer.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Stream yielded fewer bytes than the frame required.
    #[error("Truncated frame")]
    Truncated,

    /// Writing to the stream failed.
    #[error("Write failed: {message}")]
    Write {
        /// Underlying I/O error.
        message: String,
    },

    /// Operation exceeded the configured timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an OBS request failure, falling back to a generic message.
    #[inline]
    pub fn obs(comment: Option<String>) -> Self {
        Self::Obs {
            comment: comment
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| GENERIC_OBS_FAILURE.to_string()),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Transport(TransportError::Timeout {
            operation: operation.into(),
            timeout_ms,
        })
    }

    /// Creates a malformed message error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Protocol(ProtocolError::Malformed {
            message: message.into(),
        })
    }

    /// Creates a not-authorized error.
    #[inline]
    pub fn not_authorized(reason: impl Into<String>) -> Self {
        Self::Protocol(ProtocolError::NotAuthorized {
            reason: reason.into(),
        })
    }

    /// Creates a connection closed error.
    #[inline]
    pub fn connection_closed(code: Option<u16>) -> Self {
        Self::Protocol(ProtocolError::ConnectionClosed { code })
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Timeout { .. }))
    }

    /// Returns `true` if the stream could not be opened or was lost.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect(_)
                | Self::Protocol(ProtocolError::ConnectionClosed { .. })
                | Self::Transport(TransportError::Truncated)
                | Self::Transport(TransportError::Write { .. })
                | Self::Io(_)
        )
    }

    /// Returns `true` if OBS refused our credentials.
    #[inline]
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::NotAuthorized { .. }))
    }

    /// Returns `true` if OBS executed the request and reported failure.
    #[inline]
    #[must_use]
    pub fn is_obs_error(&self) -> bool {
        matches!(self, Self::Obs { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
