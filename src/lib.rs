//! OBS Remote - obs-websocket v5 control client.
//!
//! This library drives a running OBS Studio instance over its native
//! control protocol, using a WebSocket transport implemented from scratch
//! on top of a plain TCP or TLS stream.
//!
//! # Architecture
//!
//! The client is layered, leaves first:
//!
//! - **Frame codec**: RFC 6455 frame encoding/decoding (masking, extended length)
//! - **Handshake**: HTTP/1.1 Upgrade exchange and `Sec-WebSocket-Accept` check
//! - **Transport**: owned stream, ping auto-reply, close detection, timeouts
//! - **Session**: obs-websocket identify/auth handshake and request correlation
//!
//! Key design principles:
//!
//! - One [`ObsSession`] per logical operation: connect, request, close
//! - No background task, no pooling, no state shared between sessions
//! - Every blocking step is bounded by the configured timeout
//!
//! # Quick Start
//!
//! ```no_run
//! use obs_remote::{ConnectionParameters, Result, controller};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let params = ConnectionParameters::new("127.0.0.1", 4455).with_password("secret");
//!
//!     let listing = controller::list_scenes(&params).await?;
//!     println!("Scenes: {:?}", listing.scenes);
//!
//!     controller::switch_scene(&params, "Be Right Back").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Connection parameters and settings summary |
//! | [`controller`] | One-shot scene listing and switching |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Request ID wrapper |
//! | [`protocol`] | obs-websocket message types and authentication |
//! | [`session`] | obs-websocket session state machine |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Connection parameters supplied by the settings store.
pub mod config;

/// One-shot operations that open, use and close a session.
pub mod controller;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// obs-websocket v5 message types.
pub mod protocol;

/// obs-websocket session: identify handshake and typed requests.
pub mod session;

/// WebSocket transport layer.
///
/// Frame codec, HTTP upgrade and the owned duplex stream.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use config::{ConnectionParameters, SettingsSummary};

// Controller types
pub use controller::SceneListing;

// Error types
pub use error::{
    ConnectError, Error, HandshakeError, ProtocolError, Result, TransportError,
};

// Identifier types
pub use identifiers::RequestId;

// Session types
pub use session::{ObsSession, SessionState};
