//! Request and RequestResponse message types.
//!
//! Defines the `op=6` request sent by the client and the `op=7` response
//! that answers it.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// Request
// ============================================================================

/// A request from client to OBS.
///
/// # Format
///
/// ```json
/// {
///   "op": 6,
///   "d": {
///     "requestType": "SetCurrentProgramScene",
///     "requestId": "uuid",
///     "requestData": { "sceneName": "Intro" }
///   }
/// }
/// ```
///
/// `requestData` is omitted entirely when there is nothing to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// obs-websocket request name.
    pub request_type: String,

    /// Unique identifier for request/response correlation.
    pub request_id: RequestId,

    /// Request parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

impl Request {
    /// Creates a new request with auto-generated ID.
    ///
    /// `null` and `{}` data are dropped.
    #[inline]
    #[must_use]
    pub fn new(request_type: impl Into<String>, data: Option<Value>) -> Self {
        Self::with_id(RequestId::generate(), request_type, data)
    }

    /// Creates a new request with specific ID.
    #[must_use]
    pub fn with_id(id: RequestId, request_type: impl Into<String>, data: Option<Value>) -> Self {
        let request_data = data.filter(|value| match value {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        });

        Self {
            request_type: request_type.into(),
            request_id: id,
            request_data,
        }
    }
}

// ============================================================================
// RequestResponse
// ============================================================================

/// The `d` payload of an `op=7` message.
///
/// # Format
///
/// ```json
/// {
///   "requestType": "GetSceneList",
///   "requestId": "uuid",
///   "requestStatus": { "result": false, "code": 600, "comment": "..." },
///   "responseData": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    /// Echoed request name.
    #[serde(default)]
    pub request_type: String,

    /// Echoed request ID.
    #[serde(default)]
    pub request_id: String,

    /// Outcome reported by OBS.
    #[serde(default)]
    pub request_status: RequestStatus,

    /// Result data, if any.
    #[serde(default)]
    pub response_data: Option<Value>,
}

/// `requestStatus` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestStatus {
    /// `true` if the request succeeded. Missing means failure.
    pub result: bool,

    /// obs-websocket status code.
    pub code: Option<i64>,

    /// Human-readable explanation on failure.
    pub comment: Option<String>,
}

impl RequestResponse {
    /// Returns `true` if OBS reported success.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.request_status.result
    }

    /// Strips the status, failing if OBS reported an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Obs`] carrying the server comment, or a generic
    /// message when no comment was sent.
    pub fn into_result(self) -> Result<Response> {
        if !self.request_status.result {
            return Err(Error::obs(self.request_status.comment));
        }

        Ok(Response {
            request_type: self.request_type,
            request_id: self.request_id,
            response_data: self.response_data.unwrap_or(Value::Null),
        })
    }
}

// ============================================================================
// Response
// ============================================================================

/// A successful response, status removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Echoed request name.
    pub request_type: String,

    /// Echoed request ID.
    pub request_id: String,

    /// `responseData`, or `Value::Null` when OBS sent none.
    pub response_data: Value,
}

impl Response {
    /// Gets a value from the response data.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.response_data.get(key)
    }

    /// Gets a string value from the response data.
    ///
    /// Returns `None` if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Gets an array from the response data.
    ///
    /// Returns an empty slice if key not found or not an array.
    #[inline]
    #[must_use]
    pub fn get_array(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
