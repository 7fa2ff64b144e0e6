//! Protocol client.
//!
//! Opens one short-lived TCP connection per request: connect, skip the
//! welcome envelope if the server sends one, write the request, read one
//! envelope, close. The whole exchange shares a single deadline.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::{Encoder, Framed};

use crate::protocol::{ClientCodec, CodecError, Envelope, Request};

/// Failure to complete a protocol round trip.
///
/// Any of these means no envelope was received; they never describe a
/// protocol-level `ERROR` status.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before a response arrived")]
    Closed,

    #[error("undecodable response: {0}")]
    Decode(String),
}

impl From<CodecError> for ClientError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::Io(e) => ClientError::Io(e),
            other => ClientError::Decode(other.to_string()),
        }
    }
}

/// Client for the robot protocol service.
#[derive(Debug, Clone)]
pub struct ProtocolClient {
    addr: String,
    timeout: Duration,
}

impl ProtocolClient {
    /// `addr` is `host:port`; host names are resolved on every request.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one request and return the envelope answering it.
    pub async fn send(&self, request: Request) -> Result<Envelope, ClientError> {
        let command = request.command.clone();
        self.exchange(&command, request).await
    }

    /// Send `line` unmodified as one frame, for requests the typed API
    /// cannot express (malformed or unknown commands).
    pub async fn send_line(&self, line: &str) -> Result<Envelope, ClientError> {
        self.exchange("raw", line).await
    }

    async fn exchange<I>(&self, label: &str, item: I) -> Result<Envelope, ClientError>
    where
        ClientCodec: Encoder<I, Error = CodecError>,
    {
        tokio::time::timeout(self.timeout, self.round_trip(label, item))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
    }

    async fn round_trip<I>(&self, label: &str, item: I) -> Result<Envelope, ClientError>
    where
        ClientCodec: Encoder<I, Error = CodecError>,
    {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        let mut framed = Framed::new(stream, ClientCodec::default());
        framed.send(item).await?;

        loop {
            let envelope = framed.next().await.ok_or(ClientError::Closed)??;
            // The welcome is sent on accept, so it always precedes our answer.
            if envelope.is_welcome() {
                continue;
            }
            tracing::trace!(command = label, status = %envelope.status, "Response received");
            return Ok(envelope);
        }
    }

    pub async fn ping(&self) -> Result<Envelope, ClientError> {
        self.send(Request::new("PING")).await
    }

    pub async fn get_all_robots(&self) -> Result<Envelope, ClientError> {
        self.send(Request::new("GET_ALL_ROBOTS")).await
    }

    pub async fn get_robot_by_id(&self, robot_id: impl Into<Value>) -> Result<Envelope, ClientError> {
        self.send(Request::new("GET_ROBOT_BY_ID").with_param("robotId", robot_id))
            .await
    }

    pub async fn get_robot_positions(&self) -> Result<Envelope, ClientError> {
        self.send(Request::new("GET_ROBOT_POSITIONS")).await
    }

    /// `battery` is omitted from the request when `None`.
    pub async fn update_robot_position(
        &self,
        robot_id: impl Into<Value>,
        x: impl Into<Value>,
        y: impl Into<Value>,
        battery: Option<Value>,
    ) -> Result<Envelope, ClientError> {
        let mut request = Request::new("UPDATE_ROBOT_POSITION")
            .with_param("robotId", robot_id)
            .with_param("x", x)
            .with_param("y", y);
        if let Some(battery) = battery {
            request = request.with_param("battery", battery);
        }
        self.send(request).await
    }

    pub async fn update_robot_speed(
        &self,
        robot_id: impl Into<Value>,
        speed: impl Into<Value>,
    ) -> Result<Envelope, ClientError> {
        self.send(
            Request::new("UPDATE_ROBOT_SPEED")
                .with_param("robotId", robot_id)
                .with_param("speed", speed),
        )
        .await
    }

    pub async fn update_robot_battery(
        &self,
        robot_id: impl Into<Value>,
        battery: impl Into<Value>,
    ) -> Result<Envelope, ClientError> {
        self.send(
            Request::new("UPDATE_ROBOT_BATTERY")
                .with_param("robotId", robot_id)
                .with_param("battery", battery),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Status;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// One-shot server that greets, reads a line, and answers with `reply`.
    async fn scripted_server(reply: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            writer
                .write_all(
                    b"{\"status\":\"SUCCESS\",\"data\":{\"message\":\"hi\",\"availableCommands\":[]},\"message\":\"\",\"timestamp\":\"t\"}\n",
                )
                .await
                .unwrap();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            writer.write_all(reply.as_bytes()).await.unwrap();
            line
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn skips_welcome_and_returns_answer() {
        let (addr, server) = scripted_server(
            "{\"status\":\"NOT_FOUND\",\"data\":null,\"message\":\"robot not found\",\"timestamp\":\"t\"}\n",
        )
        .await;
        let client = ProtocolClient::new(addr, Duration::from_secs(2));

        let envelope = client.get_robot_by_id(5).await.unwrap();
        assert_eq!(envelope.status, Status::NotFound);
        assert_eq!(envelope.message, "robot not found");

        let sent: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["command"], "GET_ROBOT_BY_ID");
        assert_eq!(sent["params"]["robotId"], 5);
    }

    #[tokio::test]
    async fn omitted_battery_is_not_sent() {
        let (addr, server) = scripted_server(
            "{\"status\":\"SUCCESS\",\"data\":null,\"message\":\"\",\"timestamp\":\"t\"}\n",
        )
        .await;
        let client = ProtocolClient::new(addr, Duration::from_secs(2));
        client.update_robot_position(1, 2.0, 3.0, None).await.unwrap();

        let sent: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert!(sent["params"].get("battery").is_none());
    }

    #[tokio::test]
    async fn raw_line_is_sent_verbatim() {
        let (addr, server) = scripted_server(
            "{\"status\":\"INVALID_REQUEST\",\"data\":null,\"message\":\"missing command\",\"timestamp\":\"t\"}\n",
        )
        .await;
        let client = ProtocolClient::new(addr, Duration::from_secs(2));

        let envelope = client.send_line("{\"params\":[1,2]}").await.unwrap();
        assert_eq!(envelope.status, Status::InvalidRequest);
        assert_eq!(server.await.unwrap(), "{\"params\":[1,2]}\n");
    }

    #[tokio::test]
    async fn garbage_response_is_decode_error() {
        let (addr, _server) = scripted_server("<html>\n").await;
        let client = ProtocolClient::new(addr, Duration::from_secs(2));
        let error = client.ping().await.unwrap_err();
        assert!(matches!(error, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn close_without_answer_is_closed() {
        let (addr, _server) = scripted_server("").await;
        let client = ProtocolClient::new(addr, Duration::from_secs(2));
        let error = client.ping().await.unwrap_err();
        assert!(matches!(error, ClientError::Closed));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let client = ProtocolClient::new(addr, Duration::from_secs(2));
        let error = client.ping().await.unwrap_err();
        assert!(matches!(error, ClientError::Connect { .. }));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let _held = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let client = ProtocolClient::new(addr, Duration::from_millis(100));
        let error = client.ping().await.unwrap_err();
        assert!(matches!(error, ClientError::Timeout(_)));
    }
}
