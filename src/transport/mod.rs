//! WebSocket transport layer.
//!
//! A from-scratch RFC 6455 client: the session layer above only sees
//! "send text" and "receive JSON object".
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  ObsSession     │                              │  OBS Studio     │
//! │                 │     WebSocket (ws / wss)     │                 │
//! │  Transport      │◄────────────────────────────►│  obs-websocket  │
//! │  → frame codec  │        host:4455             │  server         │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `MaybeTlsStream` - Dial TCP, optionally wrap in TLS
//! 2. `handshake::perform` - HTTP/1.1 Upgrade, verify accept key
//! 3. `Transport` - Exchange frames, answer pings
//! 4. `Transport::close` - Shut the stream down
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Owned stream with message-level primitives |
//! | `frame` | Frame encoding and decoding |
//! | `handshake` | HTTP Upgrade exchange |
//! | `stream` | Plain/TLS stream variant |

// ============================================================================
// Submodules
// ============================================================================

/// Owned WebSocket connection.
pub mod connection;

/// WebSocket frame codec.
pub mod frame;

/// HTTP/1.1 Upgrade handshake.
pub mod handshake;

/// Plaintext or TLS stream.
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Transport;
pub use frame::{Frame, OpCode};
pub use stream::MaybeTlsStream;
