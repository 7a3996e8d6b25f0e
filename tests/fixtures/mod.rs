//! Test fixtures for end-to-end tests over real TCP connections

#![allow(dead_code)]

use memory_rush::config::GameSettings;
use memory_rush::coordinator::TurnCoordinator;
use memory_rush::game::FixedPermutation;
use memory_rush::server::GameServer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

/// How long a test waits for any single server line
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings with timers long enough to never fire during a test
pub fn test_settings(num_pairs: u32, max_players: usize) -> GameSettings {
    GameSettings {
        num_pairs,
        min_players: 2,
        max_players,
        turn_timeout_ms: 60_000,
        start_grace_ms: 60_000,
    }
}

/// A running server on an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub coordinator: TurnCoordinator,
    shutdown: broadcast::Sender<()>,
}

impl TestServer {
    /// Start a server whose deck is laid out exactly as `layout`
    pub async fn start(settings: GameSettings, layout: &[u32]) -> Self {
        let shuffler = FixedPermutation::from_layout(layout).expect("valid deck layout");
        let server = GameServer::bind_with_shuffler("127.0.0.1:0", settings, Arc::new(shuffler))
            .await
            .expect("bind test server");

        let addr = server.local_addr().expect("local address");
        let coordinator = server.coordinator();
        let shutdown = server.shutdown_handle();
        tokio::spawn(server.run());

        Self {
            addr,
            coordinator,
            shutdown,
        }
    }

    pub async fn connect(&self) -> TestClient {
        TestClient::connect(self.addr).await
    }

    /// Poll the session until `check` holds or the read timeout elapses
    pub async fn wait_until<F>(&self, mut check: F) -> bool
    where
        F: FnMut(&memory_rush::SessionSnapshot) -> bool,
    {
        let deadline = tokio::time::Instant::now() + READ_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if check(&self.coordinator.snapshot().await) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

/// Line-oriented client speaking the game protocol
pub struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect to server");
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("send line");
    }

    /// Next server line, or `None` once the server closed the connection
    pub async fn next_line(&mut self) -> Option<String> {
        tokio::time::timeout(READ_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for server line")
            .expect("read server line")
    }

    /// Assert the next lines are exactly `expected`, in order
    pub async fn expect_lines(&mut self, expected: &[&str]) {
        for want in expected {
            let got = self.next_line().await;
            assert_eq!(got.as_deref(), Some(*want));
        }
    }

    /// Assert the server closes the connection without sending anything else
    pub async fn expect_closed(&mut self) {
        assert_eq!(self.next_line().await, None);
    }
}
