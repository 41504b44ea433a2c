//! obs-websocket session state machine.
//!
//! Drives a fresh connection from `Unconnected` to `Identified`, then
//! issues requests one at a time and correlates each response by its
//! request ID.
//!
//! # Lifecycle
//!
//! ```text
//! Unconnected → Handshaking → AwaitingHello → Identifying → Identified → Closed
//! ```
//!
//! A session is created per logical operation and discarded after
//! [`ObsSession::close`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::config::ConnectionParameters;
use crate::error::{Error, ProtocolError, Result};
use crate::identifiers::RequestId;
use crate::protocol::auth;
use crate::protocol::{
    Hello, Identified, Identify, MessageKind, RPC_VERSION, Request, RequestResponse, Response,
    to_json,
};
use crate::transport::Transport;

// ============================================================================
// SessionState
// ============================================================================

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, nothing opened yet.
    Unconnected,
    /// Socket open, HTTP upgrade in progress.
    Handshaking,
    /// WebSocket open, waiting for `Hello`.
    AwaitingHello,
    /// `Identify` sent, waiting for `Identified`.
    Identifying,
    /// Ready for requests.
    Identified,
    /// Stream closed; the session cannot be reused.
    Closed,
}

// ============================================================================
// ObsSession
// ============================================================================

/// One obs-websocket connection.
///
/// Holds no state shared with other sessions, so independent callers may
/// each run their own session concurrently.
///
/// # Example
///
/// ```ignore
/// let mut session = ObsSession::new(params);
/// session.connect().await?;
/// let scenes = session.get_scene_list().await?;
/// session.close().await;
/// ```
#[derive(Debug)]
pub struct ObsSession {
    /// Where to connect.
    params: ConnectionParameters,
    /// Open transport, present from `Handshaking` until `Closed`.
    transport: Option<Transport>,
    /// Current lifecycle state.
    state: SessionState,
    /// RPC version from `Identified`.
    negotiated_rpc_version: Option<u32>,
}

impl ObsSession {
    /// Creates an unconnected session.
    #[inline]
    #[must_use]
    pub fn new(params: ConnectionParameters) -> Self {
        Self {
            params,
            transport: None,
            state: SessionState::Unconnected,
            negotiated_rpc_version: None,
        }
    }

    /// Creates a session and connects it.
    ///
    /// # Errors
    ///
    /// See [`ObsSession::connect`].
    pub async fn open(params: ConnectionParameters) -> Result<Self> {
        let mut session = Self::new(params);
        session.connect().await?;
        Ok(session)
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` once `Identified` has been received.
    #[inline]
    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.state == SessionState::Identified
            && self.transport.as_ref().is_some_and(Transport::is_open)
    }

    /// Returns the connection parameters.
    #[inline]
    #[must_use]
    pub const fn params(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Returns the RPC version OBS negotiated, once identified.
    #[inline]
    #[must_use]
    pub const fn negotiated_rpc_version(&self) -> Option<u32> {
        self.negotiated_rpc_version
    }
}

// ============================================================================
// Connect / Identify
// ============================================================================

impl ObsSession {
    /// Connects and identifies.
    ///
    /// The stream is closed before returning any error.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the parameters are invalid or the session was
    ///   already used
    /// - [`crate::ConnectError`] / [`crate::HandshakeError`] from the transport
    /// - [`ProtocolError::UnexpectedMessage`] if the first message is not `Hello`
    /// - [`ProtocolError::NotAuthorized`] if OBS does not answer with `Identified`
    /// - [`crate::TransportError::Timeout`] if any step stalls
    pub async fn connect(&mut self) -> Result<()> {
        if self.state != SessionState::Unconnected {
            return Err(Error::config(format!(
                "session cannot connect from state {:?}",
                self.state
            )));
        }
        self.params.validate()?;

        let result = self.identify().await;
        if let Err(ref e) = result {
            debug!(error = %e, state = ?self.state, "Connect failed");
            self.close().await;
        }
        result
    }

    async fn identify(&mut self) -> Result<()> {
        self.state = SessionState::Handshaking;
        let transport = self.transport.insert(Transport::connect(&self.params).await?);

        self.state = SessionState::AwaitingHello;
        let message = transport.receive_message().await?;
        if !message.is(MessageKind::Hello) {
            return Err(ProtocolError::UnexpectedMessage { op: message.op }.into());
        }
        let hello: Hello = message.data()?;

        trace!(
            version = hello.obs_web_socket_version.as_deref().unwrap_or("unknown"),
            auth_required = hello.authentication.is_some(),
            "Hello received"
        );

        self.state = SessionState::Identifying;
        let authentication = match (&hello.authentication, &self.params.password) {
            (Some(challenge), Some(password)) if !password.is_empty() => {
                Some(auth::answer(challenge, password))
            }
            (Some(_), _) => {
                warn!("OBS requires authentication but no password is configured");
                None
            }
            (None, _) => None,
        };

        let identify = Identify {
            rpc_version: RPC_VERSION,
            authentication,
        };
        transport
            .send_text(&to_json(MessageKind::Identify, &identify)?)
            .await?;

        let identified = match transport.receive_message().await {
            Ok(message) if message.is(MessageKind::Identified) => message,
            Ok(message) => {
                return Err(Error::not_authorized(format!(
                    "expected Identified, got op {:?}",
                    message.op
                )));
            }
            Err(Error::Protocol(ProtocolError::ConnectionClosed { code })) => {
                return Err(Error::not_authorized(match code {
                    Some(code) => format!("connection closed with code {code}"),
                    None => "connection closed".to_string(),
                }));
            }
            Err(e) => return Err(e),
        };

        let identified: Identified = identified.data()?;
        self.negotiated_rpc_version = identified.negotiated_rpc_version;
        self.state = SessionState::Identified;

        info!(
            address = %self.params.address(),
            rpc_version = ?self.negotiated_rpc_version,
            "OBS session identified"
        );
        Ok(())
    }
}

// ============================================================================
// Requests
// ============================================================================

impl ObsSession {
    /// Sends a request and waits for its matching response.
    ///
    /// Messages that are not a `RequestResponse` for this request's ID are
    /// skipped. The whole wait shares one timeout budget.
    ///
    /// Any failure other than [`Error::Obs`] closes the session: the
    /// stream may hold part of a frame and cannot be read again.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NotIdentified`] if called before `connect` succeeded
    ///   or after an earlier request closed the session
    /// - [`Error::Obs`] if OBS reports failure; the session stays usable
    /// - [`crate::TransportError::Timeout`] if no matching response arrives
    /// - transport and protocol errors from the underlying connection
    pub async fn request(&mut self, request_type: &str, data: Option<Value>) -> Result<Response> {
        let request = Request::new(request_type, data);
        let request_id = request.request_id;

        let raw = match self.exchange(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                if !matches!(e, Error::Protocol(ProtocolError::NotIdentified { .. })) {
                    debug!(request_type, %request_id, error = %e, "Request broke the connection");
                    self.close().await;
                }
                return Err(e);
            }
        };

        let response = raw.into_result();
        match &response {
            Ok(_) => trace!(request_type, %request_id, "Request succeeded"),
            Err(e) => debug!(request_type, %request_id, error = %e, "Request failed"),
        }
        response
    }

    /// Sends `request` and awaits its `RequestResponse`, status unchecked.
    async fn exchange(&mut self, request: &Request) -> Result<RequestResponse> {
        let state = self.state;
        let transport = match (&mut self.transport, state) {
            (Some(transport), SessionState::Identified) => transport,
            _ => return Err(ProtocolError::NotIdentified { state }.into()),
        };

        debug!(request_type = %request.request_type, request_id = %request.request_id, "Sending request");
        transport
            .send_text(&to_json(MessageKind::Request, request)?)
            .await?;

        let limit = transport.timeout();
        timeout(limit, await_response(transport, request.request_id))
            .await
            .map_err(|_| {
                Error::timeout(
                    format!("waiting for {} response", request.request_type),
                    self.params.timeout_ms(),
                )
            })?
    }

    /// Closes the stream. Sends nothing further.
    ///
    /// Idempotent, and safe on a session that never connected.
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        self.state = SessionState::Closed;
    }
}

/// Reads until the `RequestResponse` for `request_id` arrives.
async fn await_response(transport: &mut Transport, request_id: RequestId) -> Result<RequestResponse> {
    loop {
        let message = transport.read_message().await?;

        if !message.is(MessageKind::RequestResponse) {
            trace!(op = ?message.op, "Skipping unrelated message");
            continue;
        }

        if !message.request_id().is_some_and(|id| request_id.matches(id)) {
            trace!(other = ?message.request_id(), "Skipping response for another request");
            continue;
        }

        return message.data();
    }
}

// ============================================================================
// Tests
// ============================================================================
