//! Loopback OBS stand-in for tests.
//!
//! Speaks the server side of the WebSocket handshake and frame format with
//! the crate's own codec: unmasked frames out, masked frames in.

use std::future::Future;

use serde_json::{Value, json};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use super::frame::{self, Frame, OpCode};
use super::handshake;

/// A one-connection server running a scripted peer.
pub(crate) struct MockServer {
    port: u16,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Accepts one client, completes the upgrade, then runs `script`.
    pub(crate) async fn start<F, Fut>(script: F) -> Self
    where
        F: FnOnce(MockPeer) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::start_raw(|socket| async move {
            let peer = MockPeer::accept(socket).await;
            script(peer).await;
        })
        .await
    }

    /// Accepts one client and hands over the raw socket.
    pub(crate) async fn start_raw<F, Fut>(script: F) -> Self
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            script(socket).await;
        });

        Self { port, handle }
    }

    /// Port the server listens on.
    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the script, surfacing its assertion failures.
    pub(crate) async fn finish(self) {
        self.handle.await.expect("mock server script failed");
    }

    /// Reads the client's upgrade request head.
    pub(crate) async fn read_request(socket: &mut TcpStream) -> Vec<String> {
        let mut reader = BufReader::new(socket);
        handshake::read_response_head(&mut reader)
            .await
            .expect("upgrade request")
    }
}

/// Server side of an upgraded connection.
pub(crate) struct MockPeer {
    socket: BufReader<TcpStream>,
}

impl MockPeer {
    async fn accept(mut socket: TcpStream) -> Self {
        let request = MockServer::read_request(&mut socket).await;
        let key = request
            .iter()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("sec-websocket-key")
                    .then(|| value.trim().to_string())
            })
            .expect("Sec-WebSocket-Key header");

        let response = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n\r\n",
            handshake::accept_key(&key)
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write upgrade response");

        Self {
            socket: BufReader::new(socket),
        }
    }

    /// Sends an unmasked frame.
    pub(crate) async fn send_frame(&mut self, opcode: OpCode, payload: &[u8]) {
        let wire = frame::write_frame(opcode, payload, None);
        self.socket.write_all(&wire).await.expect("write frame");
        self.socket.flush().await.expect("flush");
    }

    /// Writes raw bytes, for hand-built or partial frames.
    pub(crate) async fn send_raw(&mut self, bytes: &[u8]) {
        self.socket.write_all(bytes).await.expect("write bytes");
        self.socket.flush().await.expect("flush");
    }

    /// Sends a JSON text frame.
    pub(crate) async fn send_json(&mut self, value: &Value) {
        let text = serde_json::to_string(value).expect("serialize");
        self.send_frame(OpCode::Text, text.as_bytes()).await;
    }

    /// Receives a client frame, asserting it was masked.
    pub(crate) async fn recv_frame(&mut self) -> Option<Frame> {
        let frame = frame::read_frame(&mut self.socket).await.expect("read frame")?;
        assert!(frame.is_masked(), "client frames must be masked");
        assert!(frame.fin, "client frames must not be fragmented");
        Some(frame)
    }

    /// Receives a client text frame as JSON.
    pub(crate) async fn recv_json(&mut self) -> Value {
        let frame = self.recv_frame().await.expect("client frame");
        assert_eq!(frame.opcode, OpCode::Text);
        serde_json::from_slice(&frame.payload).expect("client JSON")
    }
}

// ============================================================================
// obs-websocket Script Helpers
// ============================================================================

impl MockPeer {
    /// Sends `Hello` with the given payload, reads `Identify`, sends
    /// `Identified`. Returns the `Identify` payload.
    pub(crate) async fn identify_with(&mut self, hello: Value) -> Value {
        self.send_json(&json!({"op": 0, "d": hello})).await;
        let identify = self.recv_json().await;
        assert_eq!(identify["op"], 1, "expected Identify");
        self.send_json(&json!({"op": 2, "d": {"negotiatedRpcVersion": 1}}))
            .await;
        identify["d"].clone()
    }

    /// Identifies without an authentication challenge.
    pub(crate) async fn identify(&mut self) -> Value {
        self.identify_with(json!({"obsWebSocketVersion": "5.4.2", "rpcVersion": 1}))
            .await
    }

    /// Reads the next `Request`, asserting its type.
    pub(crate) async fn expect_request(&mut self, request_type: &str) -> Value {
        let request = self.recv_json().await;
        assert_eq!(request["op"], 6, "expected Request");
        assert_eq!(request["d"]["requestType"], request_type);
        request["d"].clone()
    }

    /// Answers `request` successfully with `response_data`.
    pub(crate) async fn respond(&mut self, request: &Value, response_data: Value) {
        self.send_json(&json!({
            "op": 7,
            "d": {
                "requestType": request["requestType"],
                "requestId": request["requestId"],
                "requestStatus": {"result": true, "code": 100},
                "responseData": response_data,
            }
        }))
        .await;
    }

    /// Answers `request` with a failure status.
    pub(crate) async fn respond_error(&mut self, request: &Value, comment: Option<&str>) {
        let mut status = json!({"result": false, "code": 600});
        if let Some(comment) = comment {
            status["comment"] = json!(comment);
        }
        self.send_json(&json!({
            "op": 7,
            "d": {
                "requestType": request["requestType"],
                "requestId": request["requestId"],
                "requestStatus": status,
            }
        }))
        .await;
    }
}
