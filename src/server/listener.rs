//! TCP accept loop for the game server

use crate::config::GameSettings;
use crate::coordinator::TurnCoordinator;
use crate::error::{GameError, Result};
use crate::game::{RandomShuffle, Shuffle};
use crate::registry::ConnectionRegistry;
use crate::server::connection::handle_connection;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Line-protocol server hosting a single game session
pub struct GameServer {
    listener: TcpListener,
    coordinator: TurnCoordinator,
    registry: Arc<ConnectionRegistry>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl GameServer {
    /// Bind `address` and prepare a session dealing shuffled decks
    pub async fn bind(address: &str, settings: GameSettings) -> Result<Self> {
        Self::bind_with_shuffler(address, settings, Arc::new(RandomShuffle)).await
    }

    pub async fn bind_with_shuffler(
        address: &str,
        settings: GameSettings,
        shuffler: Arc<dyn Shuffle>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| GameError::Transport {
                message: format!("Failed to bind {}: {}", address, e),
            })?;

        let registry = Arc::new(ConnectionRegistry::new());
        let coordinator = TurnCoordinator::with_shuffler(settings, registry.clone(), shuffler);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Ok(Self {
            listener,
            coordinator,
            registry,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|e| {
            GameError::Transport {
                message: format!("Failed to read local address: {}", e),
            }
            .into()
        })
    }

    /// Handle to the session, for inspection
    pub fn coordinator(&self) -> TurnCoordinator {
        self.coordinator.clone()
    }

    /// Sender that stops [`GameServer::run`] when signalled
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Accept connections until shutdown is signalled
    pub async fn run(self) -> Result<()> {
        info!("Memory Rush server listening on {}", self.local_addr()?);
        let Self {
            listener,
            coordinator,
            registry,
            mut shutdown_rx,
            ..
        } = self;

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("New connection from {}", peer);
                        let coordinator = coordinator.clone();
                        let registry = registry.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, coordinator, registry).await {
                                error!("Connection {} ended with error: {:#}", peer, e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                },
                _ = shutdown_rx.recv() => {
                    info!("Server shutdown signal received");
                    break;
                }
            }
        }

        info!("Server stopped accepting connections");
        Ok(())
    }
}
