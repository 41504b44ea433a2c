//! Type-safe identifiers.
//!
//! obs-websocket lets the client pick any string as a request id; this
//! crate always uses a random UUID v4 so every request on a connection is
//! distinguishable from stray responses.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// RequestId
// ============================================================================

/// Correlates a `Request` with its `RequestResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns `true` if `raw` is exactly the string this ID was sent as.
    ///
    /// Other spellings of the same UUID (uppercase, braced, simple, URN)
    /// do not match.
    #[inline]
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        let mut buf = Uuid::encode_buffer();
        raw == &*self.0.hyphenated().encode_lower(&mut buf)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    #[inline]
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// Tests
// ============================================================================
