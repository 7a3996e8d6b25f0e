//! Live connection tracking and fan-out
//!
//! Each connection owns an unbounded channel drained by its writer task.
//! Delivering an event only enqueues it, so callers may broadcast while
//! holding the coordinator lock and every connection still sees events in
//! the order they were produced.
//!
//! A freshly registered connection only receives direct sends. Broadcasts
//! reach it once the coordinator admits it, which happens in the same
//! critical section that sends its `NAME`.

use crate::error::{GameError, Result};
use crate::protocol::ServerEvent;
use crate::registry::broadcaster::Broadcaster;
use crate::types::ConnectionId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Receiving end handed to a connection's writer task
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

#[derive(Debug)]
struct Outbound {
    sender: mpsc::UnboundedSender<ServerEvent>,
    admitted: bool,
}

/// Registry of outbound channels for every live connection
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Outbound>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the stream of events destined for it
    pub fn register(&self, connection: ConnectionId) -> Result<EventReceiver> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut connections = self.connections.write().map_err(|_| GameError::Internal {
            message: "Failed to acquire connections lock".to_string(),
        })?;
        connections.insert(
            connection,
            Outbound {
                sender,
                admitted: false,
            },
        );
        debug!(
            "Registered connection {} ({} live)",
            connection,
            connections.len()
        );
        Ok(receiver)
    }

    /// Drop a connection's channel; its writer task then drains and stops
    pub fn unregister(&self, connection: ConnectionId) -> Result<bool> {
        let mut connections = self.connections.write().map_err(|_| GameError::Internal {
            message: "Failed to acquire connections lock".to_string(),
        })?;
        let removed = connections.remove(&connection).is_some();
        if removed {
            info!(
                "Removed connection {} ({} live)",
                connection,
                connections.len()
            );
        }
        Ok(removed)
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.connections
            .read()
            .map(|connections| connections.contains_key(&connection))
            .unwrap_or(false)
    }

    /// Whether broadcasts currently reach `connection`
    pub fn is_admitted(&self, connection: ConnectionId) -> bool {
        self.connections
            .read()
            .map(|connections| {
                connections
                    .get(&connection)
                    .map_or(false, |outbound| outbound.admitted)
            })
            .unwrap_or(false)
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.connections
            .read()
            .map(|connections| connections.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Broadcaster for ConnectionRegistry {
    async fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> Result<()> {
        let connections = self.connections.read().map_err(|_| GameError::Internal {
            message: "Failed to acquire connections lock".to_string(),
        })?;
        match connections.get(&connection) {
            Some(outbound) => {
                if outbound.sender.send(event).is_err() {
                    debug!("Connection {} closed before delivery", connection);
                }
            }
            None => debug!(
                "Dropping {} for unknown connection {}",
                event.kind(),
                connection
            ),
        }
        Ok(())
    }

    async fn broadcast(&self, event: ServerEvent) -> Result<()> {
        let connections = self.connections.read().map_err(|_| GameError::Internal {
            message: "Failed to acquire connections lock".to_string(),
        })?;
        for (connection, outbound) in connections.iter() {
            if !outbound.admitted {
                continue;
            }
            if outbound.sender.send(event.clone()).is_err() {
                debug!(
                    "Skipping {} for closed connection {}",
                    event.kind(),
                    connection
                );
            }
        }
        Ok(())
    }

    async fn add_connection(&self, connection: ConnectionId) -> Result<bool> {
        let mut connections = self.connections.write().map_err(|_| GameError::Internal {
            message: "Failed to acquire connections lock".to_string(),
        })?;
        match connections.get_mut(&connection) {
            Some(outbound) => {
                outbound.admitted = true;
                Ok(true)
            }
            None => {
                debug!("Cannot admit unknown connection {}", connection);
                Ok(false)
            }
        }
    }

    async fn remove_connection(&self, connection: ConnectionId) -> Result<bool> {
        self.unregister(connection)
    }
}
