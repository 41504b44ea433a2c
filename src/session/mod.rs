//! obs-websocket sessions.
//!
//! An [`ObsSession`] owns one [`crate::transport::Transport`] and walks the
//! identify handshake before any request may be sent. Scene operations are
//! typed wrappers over [`ObsSession::request`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | State machine, identify, request correlation |
//! | `scenes` | Scene list, program scene, scene switching |

// ============================================================================
// Submodules
// ============================================================================

/// Session state machine and request correlation.
pub mod core;

/// Typed scene requests.
pub mod scenes;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{ObsSession, SessionState};
