//! obs-websocket message envelope and identify payloads.
//!
//! Every message is a JSON object `{ "op": <int>, "d": { ... } }` where
//! `op` selects the shape of `d`.
//!
//! | Kind | op | Direction |
//! |------|----|-----------|
//! | `Hello` | 0 | OBS → client |
//! | `Identify` | 1 | client → OBS |
//! | `Identified` | 2 | OBS → client |
//! | `Request` | 6 | client → OBS |
//! | `RequestResponse` | 7 | OBS → client |
//!
//! Other op codes (events, batches) may arrive and are skipped by the
//! session; this client never sends them.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// MessageKind
// ============================================================================

/// The op codes this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// Server greeting, may carry an auth challenge.
    Hello = 0,
    /// Client identification.
    Identify = 1,
    /// Identification accepted.
    Identified = 2,
    /// Client request.
    Request = 6,
    /// Response to a request.
    RequestResponse = 7,
}

impl MessageKind {
    /// Maps a wire op code to a known kind.
    #[must_use]
    pub const fn from_op(op: u64) -> Option<Self> {
        match op {
            0 => Some(Self::Hello),
            1 => Some(Self::Identify),
            2 => Some(Self::Identified),
            6 => Some(Self::Request),
            7 => Some(Self::RequestResponse),
            _ => None,
        }
    }

    /// Returns the wire op code.
    #[inline]
    #[must_use]
    pub const fn op(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// ProtocolMessage
// ============================================================================

/// A decoded incoming message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolMessage {
    /// Raw op code; `None` if missing or not an integer.
    pub op: Option<u64>,
    /// Payload; `Value::Null` if missing.
    pub d: Value,
}

impl ProtocolMessage {
    /// Parses a frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProtocolError::Malformed`] if the payload is not
    /// valid JSON or not a JSON object.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| Error::malformed(format!("invalid JSON: {e}")))?;

        let Value::Object(mut object) = value else {
            return Err(Error::malformed("message is not a JSON object"));
        };

        Ok(Self {
            op: object.get("op").and_then(Value::as_u64),
            d: object.remove("d").unwrap_or(Value::Null),
        })
    }

    /// Returns the known kind of this message.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<MessageKind> {
        self.op.and_then(MessageKind::from_op)
    }

    /// Returns `true` if this message has the given kind.
    #[inline]
    #[must_use]
    pub fn is(&self, kind: MessageKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Returns `d.requestId` as a string, if present.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.d.get("requestId").and_then(Value::as_str)
    }

    /// Deserializes `d` into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProtocolError::Malformed`] if `d` has the wrong shape.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.d).map_err(|e| Error::malformed(format!("invalid payload: {e}")))
    }
}

// ============================================================================
// Outgoing Envelope
// ============================================================================

#[derive(Serialize)]
struct Envelope<'a, T> {
    op: u8,
    d: &'a T,
}

/// Serializes `{ "op": kind, "d": data }`.
///
/// # Errors
///
/// Returns [`Error::Json`] if `data` cannot be serialized.
pub fn to_json<T: Serialize>(kind: MessageKind, data: &T) -> Result<String> {
    Ok(serde_json::to_string(&Envelope {
        op: kind.op(),
        d: data,
    })?)
}

// ============================================================================
// Hello / Identify / Identified
// ============================================================================

/// `Hello` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hello {
    /// obs-websocket plugin version.
    pub obs_web_socket_version: Option<String>,
    /// Latest RPC version the server supports.
    pub rpc_version: Option<u32>,
    /// Present when the server requires authentication.
    pub authentication: Option<AuthChallenge>,
}

/// Authentication parameters offered in `Hello`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthChallenge {
    /// Per-connection challenge.
    pub challenge: String,
    /// Password salt.
    pub salt: String,
}

/// `Identify` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    /// RPC version requested by the client.
    pub rpc_version: u32,
    /// Authentication string, only when a challenge was answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
}

/// `Identified` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identified {
    /// RPC version the server settled on.
    pub negotiated_rpc_version: Option<u32>,
}

// ============================================================================
// Tests
// ============================================================================
