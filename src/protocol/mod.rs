//! obs-websocket v5 protocol message types.
//!
//! This module defines the JSON messages exchanged with OBS once the
//! WebSocket is open, plus the authentication derivation.
//!
//! # Protocol Overview
//!
//! | Message | op | Direction | Purpose |
//! |---------|----|-----------|---------|
//! | `Hello` | 0 | OBS → client | Greeting, optional auth challenge |
//! | `Identify` | 1 | client → OBS | RPC version + auth string |
//! | `Identified` | 2 | OBS → client | Session ready |
//! | `Request` | 6 | client → OBS | Call by `requestType` |
//! | `RequestResponse` | 7 | OBS → client | Result, matched by `requestId` |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `auth` | Challenge-response derivation |
//! | `message` | Envelope and identify payloads |
//! | `request` | Request and RequestResponse types |

// ============================================================================
// Submodules
// ============================================================================

/// Challenge-response authentication.
pub mod auth;

/// Envelope and identify payloads.
pub mod message;

/// Request and RequestResponse message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::authentication_string;
pub use message::{AuthChallenge, Hello, Identified, Identify, MessageKind, ProtocolMessage, to_json};
pub use request::{Request, RequestResponse, RequestStatus, Response};

// ============================================================================
// Constants
// ============================================================================

/// RPC version sent in `Identify`.
pub const RPC_VERSION: u32 = 1;
