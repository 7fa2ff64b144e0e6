//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use robot_fleet::config::FleetConfig;
use robot_fleet::lifecycle::Shutdown;
use robot_fleet::net::{Listener, ProtocolServer};
use robot_fleet::store::{MemoryStore, RobotId, RobotRecord, StoreError, StoreGateway};

/// Robot 7 matches the documented speed-update scenario.
pub fn seed_fleet() -> Vec<RobotRecord> {
    vec![robot(7, 1.0, 1.0, 0.0, 80.0), robot(3, 5.0, -2.0, 1.5, 40.0)]
}

pub fn robot(id: u32, x: f64, y: f64, speed: f64, battery: f64) -> RobotRecord {
    RobotRecord {
        id: RobotId::new(id).unwrap(),
        x,
        y,
        speed,
        battery,
    }
}

/// Configuration bound to an ephemeral loopback port, without a welcome.
pub fn test_config() -> FleetConfig {
    let mut config = FleetConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.protocol.send_welcome = false;
    config.timeouts.shutdown_grace_secs = 2;
    config
}

/// Store double that counts calls and can be switched to failing or slow.
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl CountingStore {
    pub fn new(records: Vec<RobotRecord>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(4, records),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every later call take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused by database".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StoreGateway for CountingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.enter().await?;
        self.inner.ping().await
    }

    async fn get_all(&self) -> Result<Vec<RobotRecord>, StoreError> {
        self.enter().await?;
        self.inner.get_all().await
    }

    async fn get_by_id(&self, id: RobotId) -> Result<Option<RobotRecord>, StoreError> {
        self.enter().await?;
        self.inner.get_by_id(id).await
    }

    async fn get_positions(&self) -> Result<Vec<RobotRecord>, StoreError> {
        self.enter().await?;
        self.inner.get_positions().await
    }

    async fn set_position(&self, id: RobotId, x: f64, y: f64, battery: f64) -> Result<u64, StoreError> {
        self.enter().await?;
        self.inner.set_position(id, x, y, battery).await
    }

    async fn set_speed(&self, id: RobotId, speed: f64) -> Result<u64, StoreError> {
        self.enter().await?;
        self.inner.set_speed(id, speed).await
    }

    async fn set_battery(&self, id: RobotId, battery: f64) -> Result<u64, StoreError> {
        self.enter().await?;
        self.inner.set_battery(id, battery).await
    }
}

/// A running protocol server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    /// Trigger shutdown and wait for the server to return.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .unwrap();
    }
}

pub async fn start_server(config: FleetConfig, store: Arc<dyn StoreGateway>) -> TestServer {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr();
    let server = ProtocolServer::new(&config, store);
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Raw line-oriented protocol client.
pub struct LineClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl LineClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    pub async fn send(&mut self, request: Value) {
        let mut line = request.to_string();
        line.push('\n');
        self.send_raw(line.as_bytes()).await;
    }

    /// Half-close the write side.
    pub async fn finish(&mut self) {
        self.writer.shutdown().await.unwrap();
    }

    /// Next envelope, or `None` when the server closed the connection.
    pub async fn try_recv(&mut self, wait: Duration) -> Option<Value> {
        let mut line = String::new();
        let n = tokio::time::timeout(wait, self.reader.read_line(&mut line))
            .await
            .expect("no response in time")
            .unwrap_or(0);
        (n > 0).then(|| serde_json::from_str(&line).unwrap())
    }

    pub async fn recv(&mut self) -> Value {
        self.try_recv(Duration::from_secs(5))
            .await
            .expect("connection closed")
    }

    pub async fn request(&mut self, request: Value) -> Value {
        self.send(request).await;
        self.recv().await
    }
}
