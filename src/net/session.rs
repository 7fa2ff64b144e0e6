//! Per-connection request/response loop.
//!
//! # Data Flow
//! ```text
//! Accepted ──(welcome)──→ AwaitingRequest ──frame──→ Processing
//!                              ↑                         │
//!                              └──── envelope written ───┘
//!
//! AwaitingRequest ──(idle timeout | peer close | shutdown)──→ Closed
//! Processing ──(write error | write timeout)──→ Closed
//! ```
//!
//! # Design Decisions
//! - Strictly sequential: the next frame is not read until the current
//!   envelope is flushed
//! - Dispatch runs inside a panic boundary and a deadline; both degrade to
//!   an `ERROR` envelope and the connection stays open
//! - Shutdown is only observed while awaiting a request, so an in-flight
//!   request always gets its envelope, as do complete frames already read
//!   into the buffer

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::catalog;
use crate::config::FleetConfig;
use crate::dispatch::Dispatcher;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::protocol::{Envelope, Payload, Request, ServerCodec};

use super::connection::{ConnectionId, ConnectionState};

/// Message of the envelope returned when a handler panics.
pub const INTERNAL_ERROR: &str = "internal server error";

/// Message of the envelope returned when dispatch exceeds its deadline.
pub const REQUEST_TIMED_OUT: &str = "request timed out";

/// Per-connection settings, shared by every session of a server.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub request_timeout: Duration,
    pub write_timeout: Duration,
    pub max_frame_bytes: usize,
    pub send_welcome: bool,
}

impl SessionSettings {
    pub fn from_config(config: &FleetConfig) -> Self {
        Self {
            idle_timeout: Duration::from_secs(config.timeouts.idle_secs),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            write_timeout: Duration::from_secs(config.timeouts.write_secs),
            max_frame_bytes: config.protocol.max_frame_bytes,
            send_welcome: config.protocol.send_welcome,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&FleetConfig::default())
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    IdleTimeout,
    Shutdown,
    ReadError(String),
    WriteError(String),
    WriteTimeout,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::PeerClosed => write!(f, "peer closed"),
            CloseReason::IdleTimeout => write!(f, "idle timeout"),
            CloseReason::Shutdown => write!(f, "server shutdown"),
            CloseReason::ReadError(e) => write!(f, "read error: {}", e),
            CloseReason::WriteError(e) => write!(f, "write error: {}", e),
            CloseReason::WriteTimeout => write!(f, "write timed out"),
        }
    }
}

/// One accepted connection.
pub struct Session<S> {
    id: ConnectionId,
    framed: Framed<S, ServerCodec>,
    dispatcher: Dispatcher,
    settings: Arc<SessionSettings>,
    state: ConnectionState,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        id: ConnectionId,
        stream: S,
        dispatcher: Dispatcher,
        settings: Arc<SessionSettings>,
    ) -> Self {
        let codec = ServerCodec::new(settings.max_frame_bytes);
        Self {
            id,
            framed: Framed::new(stream, codec),
            dispatcher,
            settings,
            state: ConnectionState::Accepted,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Serve requests until the connection closes.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> CloseReason {
        if self.settings.send_welcome {
            if let Err(reason) = self.send(Envelope::success(catalog::welcome())).await {
                return self.close(reason);
            }
        }

        loop {
            self.transition(ConnectionState::AwaitingRequest);

            // Frames the peer already delivered are answered before a
            // shutdown closes the connection.
            let buffered = self.has_buffered_frame();
            let next = tokio::select! {
                biased;
                _ = shutdown.wait(), if !buffered => return self.close(CloseReason::Shutdown),
                next = tokio::time::timeout(self.settings.idle_timeout, self.framed.next()) => next,
            };

            let frame = match next {
                Err(_) => return self.close(CloseReason::IdleTimeout),
                Ok(None) => return self.close(CloseReason::PeerClosed),
                Ok(Some(Err(e))) => return self.close(CloseReason::ReadError(e.to_string())),
                Ok(Some(Ok(frame))) => frame,
            };

            self.transition(ConnectionState::Processing);
            let envelope = match frame {
                Ok(request) => self.process(request).await,
                Err(failure) => {
                    tracing::debug!(reason = failure.reason(), error = %failure, "Undecodable request");
                    metrics::record_decode_failure(failure.reason());
                    Envelope::invalid_request(failure.to_string())
                }
            };

            if let Err(reason) = self.send(envelope).await {
                return self.close(reason);
            }
        }
    }

    async fn process(&self, request: Request) -> Envelope<Payload> {
        let dispatch = AssertUnwindSafe(self.dispatcher.dispatch(&request)).catch_unwind();

        match tokio::time::timeout(self.settings.request_timeout, dispatch).await {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(panic)) => {
                tracing::error!(
                    command = %request.command,
                    panic = panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                Envelope::error(INTERNAL_ERROR)
            }
            Err(_) => {
                tracing::warn!(
                    command = %request.command,
                    timeout_ms = self.settings.request_timeout.as_millis() as u64,
                    "Request timed out"
                );
                Envelope::error(REQUEST_TIMED_OUT)
            }
        }
    }

    async fn send(&mut self, envelope: Envelope<Payload>) -> Result<(), CloseReason> {
        match tokio::time::timeout(self.settings.write_timeout, self.framed.send(envelope)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CloseReason::WriteError(e.to_string())),
            Err(_) => Err(CloseReason::WriteTimeout),
        }
    }

    fn has_buffered_frame(&self) -> bool {
        self.framed.read_buffer().contains(&b'\n')
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::trace!(from = self.state.as_str(), to = next.as_str(), "Connection state");
        self.state = next;
    }

    fn close(&mut self, reason: CloseReason) -> CloseReason {
        self.transition(ConnectionState::Closed);
        match &reason {
            CloseReason::ReadError(_) | CloseReason::WriteError(_) | CloseReason::WriteTimeout => {
                tracing::warn!(reason = %reason, "Connection closed")
            }
            _ => tracing::debug!(reason = %reason, "Connection closed"),
        }
        reason
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::CountingStore;
    use crate::lifecycle::Shutdown;
    use crate::store::{RobotId, RobotRecord, StoreError, StoreGateway};
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
    use tokio::task::JoinHandle;

    /// Store whose reads panic or hang, depending on the robot asked for.
    struct FaultyStore;

    #[async_trait]
    impl StoreGateway for FaultyStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_all(&self) -> Result<Vec<RobotRecord>, StoreError> {
            panic!("row decoder exploded");
        }

        async fn get_by_id(&self, _id: RobotId) -> Result<Option<RobotRecord>, StoreError> {
            std::future::pending().await
        }

        async fn get_positions(&self) -> Result<Vec<RobotRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn set_position(&self, _: RobotId, _: f64, _: f64, _: f64) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn set_speed(&self, _: RobotId, _: f64) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn set_battery(&self, _: RobotId, _: f64) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    struct Peer {
        reader: BufReader<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
        session: JoinHandle<CloseReason>,
        shutdown: Shutdown,
    }

    impl Peer {
        async fn write(&mut self, bytes: &[u8]) {
            self.writer.write_all(bytes).await.unwrap();
        }

        async fn read(&mut self) -> Value {
            let mut line = String::new();
            let n = tokio::time::timeout(Duration::from_secs(2), self.reader.read_line(&mut line))
                .await
                .unwrap()
                .unwrap();
            assert!(n > 0, "connection closed");
            serde_json::from_str(&line).unwrap()
        }
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            idle_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_millis(200),
            write_timeout: Duration::from_secs(1),
            max_frame_bytes: 256,
            send_welcome: false,
        }
    }

    fn start(store: Arc<dyn StoreGateway>, settings: SessionSettings) -> Peer {
        let (client, server) = tokio::io::duplex(4096);
        let shutdown = Shutdown::new();
        let session = Session::new(
            ConnectionId::new(),
            server,
            Dispatcher::new(store),
            Arc::new(settings),
        );
        let session = tokio::spawn(session.run(shutdown.subscribe()));
        let (reader, writer) = tokio::io::split(client);
        Peer {
            reader: BufReader::new(reader),
            writer,
            session,
            shutdown,
        }
    }

    fn fleet() -> Arc<CountingStore> {
        Arc::new(CountingStore::new(vec![RobotRecord {
            id: RobotId::new(7).unwrap(),
            x: 1.0,
            y: 1.0,
            speed: 0.0,
            battery: 80.0,
        }]))
    }

    #[tokio::test]
    async fn welcome_lists_commands() {
        let mut peer = start(fleet(), SessionSettings { send_welcome: true, ..settings() });
        let welcome = peer.read().await;
        assert_eq!(welcome["status"], "SUCCESS");
        assert_eq!(welcome["data"]["message"], "Robot Management TCP Server");
        assert_eq!(welcome["data"]["availableCommands"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn split_frame_is_reassembled() {
        let mut peer = start(fleet(), settings());
        peer.write(b"{\"command\":\"GET_ROBOT").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        peer.write(b"_BY_ID\",\"params\":{\"robotId\":7}}\n").await;
        let response = peer.read().await;
        assert_eq!(response["status"], "SUCCESS");
        assert_eq!(response["data"]["id"], 7);
    }

    #[tokio::test]
    async fn coalesced_frames_get_one_envelope_each_in_order() {
        let mut peer = start(fleet(), settings());
        peer.write(b"{\"command\":\"PING\"}\n{\"command\":\"GET_ROBOT_BY_ID\",\"params\":{\"robotId\":99}}\n")
            .await;
        assert_eq!(peer.read().await["status"], "SUCCESS");
        assert_eq!(peer.read().await["status"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_then_valid_request() {
        let mut peer = start(fleet(), settings());
        peer.write(b"this is not json\n").await;
        let rejected = peer.read().await;
        assert_eq!(rejected["status"], "INVALID_REQUEST");
        assert_eq!(rejected["data"], Value::Null);

        peer.write(b"{\"command\":\"PING\"}\n").await;
        assert_eq!(peer.read().await["data"]["message"], "pong");
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_once() {
        let mut peer = start(fleet(), settings());
        let mut frame = vec![b'x'; 1024];
        frame.push(b'\n');
        peer.write(&frame).await;
        let rejected = peer.read().await;
        assert_eq!(rejected["status"], "INVALID_REQUEST");
        assert!(rejected["message"].as_str().unwrap().contains("256 byte limit"));

        peer.write(b"{\"command\":\"PING\"}\n").await;
        assert_eq!(peer.read().await["status"], "SUCCESS");
    }

    #[tokio::test]
    async fn panicking_handler_yields_error_and_connection_survives() {
        let mut peer = start(Arc::new(FaultyStore), settings());
        peer.write(b"{\"command\":\"GET_ALL_ROBOTS\"}\n").await;
        let response = peer.read().await;
        assert_eq!(response["status"], "ERROR");
        assert_eq!(response["message"], INTERNAL_ERROR);

        peer.write(b"{\"command\":\"PING\"}\n").await;
        assert_eq!(peer.read().await["status"], "SUCCESS");
    }

    #[tokio::test]
    async fn slow_dispatch_times_out() {
        let mut peer = start(Arc::new(FaultyStore), settings());
        peer.write(b"{\"command\":\"GET_ROBOT_BY_ID\",\"params\":{\"robotId\":1}}\n")
            .await;
        let response = peer.read().await;
        assert_eq!(response["status"], "ERROR");
        assert_eq!(response["message"], REQUEST_TIMED_OUT);
    }

    #[tokio::test]
    async fn idle_connection_is_closed() {
        let peer = start(
            fleet(),
            SessionSettings {
                idle_timeout: Duration::from_millis(50),
                ..settings()
            },
        );
        let reason = tokio::time::timeout(Duration::from_secs(2), peer.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, CloseReason::IdleTimeout);
    }

    #[tokio::test]
    async fn eof_flushes_unterminated_request() {
        let mut peer = start(fleet(), settings());
        peer.write(b"{\"command\":\"PING\"}").await;
        peer.writer.shutdown().await.unwrap();
        assert_eq!(peer.read().await["status"], "SUCCESS");
        let reason = peer.session.await.unwrap();
        assert_eq!(reason, CloseReason::PeerClosed);
    }

    #[tokio::test]
    async fn shutdown_during_dispatch_still_answers() {
        let store = Arc::new(CountingStore::delayed(Vec::new(), Duration::from_millis(150)));
        let mut peer = start(
            store,
            SessionSettings {
                request_timeout: Duration::from_secs(2),
                ..settings()
            },
        );
        peer.write(b"{\"command\":\"GET_ALL_ROBOTS\"}\n").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        peer.shutdown.trigger();

        assert_eq!(peer.read().await["status"], "SUCCESS");
        let reason = tokio::time::timeout(Duration::from_secs(2), peer.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, CloseReason::Shutdown);
    }

    #[tokio::test]
    async fn shutdown_answers_frames_already_buffered() {
        let store = Arc::new(CountingStore::delayed(Vec::new(), Duration::from_millis(150)));
        let mut peer = start(
            store,
            SessionSettings {
                request_timeout: Duration::from_secs(2),
                ..settings()
            },
        );
        peer.write(b"{\"command\":\"GET_ROBOT_POSITIONS\"}\n{\"command\":\"PING\"}\n")
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        peer.shutdown.trigger();

        assert_eq!(peer.read().await["data"], serde_json::json!([]));
        assert_eq!(peer.read().await["data"]["message"], "pong");
        let reason = tokio::time::timeout(Duration::from_secs(2), peer.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, CloseReason::Shutdown);
    }

    #[tokio::test]
    async fn shutdown_closes_waiting_session() {
        let peer = start(fleet(), settings());
        peer.shutdown.trigger();
        let reason = tokio::time::timeout(Duration::from_secs(2), peer.session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, CloseReason::Shutdown);
    }
}
