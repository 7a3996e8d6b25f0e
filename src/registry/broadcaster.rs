//! Outbound event delivery seam
//!
//! The coordinator only talks to connections through [`Broadcaster`], which
//! keeps it testable with no network I/O at all.

use crate::error::{GameError, Result};
use crate::protocol::ServerEvent;
use crate::types::ConnectionId;
use async_trait::async_trait;
use std::sync::Mutex;

/// Trait for delivering server events to connections
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Deliver an event to a single connection
    async fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> Result<()>;

    /// Deliver an event to every admitted connection, best-effort
    async fn broadcast(&self, event: ServerEvent) -> Result<()>;

    /// Start including a connection in broadcasts; returns whether it was known
    async fn add_connection(&self, connection: ConnectionId) -> Result<bool>;

    /// Drop a connection; returns whether it was registered
    async fn remove_connection(&self, connection: ConnectionId) -> Result<bool>;
}

/// A recorded delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// `None` for broadcasts
    pub target: Option<ConnectionId>,
    pub event: ServerEvent,
}

/// In-memory broadcaster that records everything it is asked to deliver
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    deliveries: Mutex<Vec<Delivery>>,
    added: Mutex<Vec<ConnectionId>>,
    removed: Mutex<Vec<ConnectionId>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery in the order it was requested
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .map(|deliveries| deliveries.clone())
            .unwrap_or_default()
    }

    /// Broadcast events only, in order
    pub fn broadcasts(&self) -> Vec<ServerEvent> {
        self.deliveries()
            .into_iter()
            .filter(|delivery| delivery.target.is_none())
            .map(|delivery| delivery.event)
            .collect()
    }

    /// Broadcast events rendered to their wire text
    pub fn broadcast_lines(&self) -> Vec<String> {
        self.broadcasts().iter().map(ToString::to_string).collect()
    }

    /// Events sent directly to `connection`
    pub fn sent_to(&self, connection: ConnectionId) -> Vec<ServerEvent> {
        self.deliveries()
            .into_iter()
            .filter(|delivery| delivery.target == Some(connection))
            .map(|delivery| delivery.event)
            .collect()
    }

    /// Connections the coordinator admitted to broadcasts
    pub fn added(&self) -> Vec<ConnectionId> {
        self.added
            .lock()
            .map(|added| added.clone())
            .unwrap_or_default()
    }

    /// Connections the coordinator asked to drop
    pub fn removed(&self) -> Vec<ConnectionId> {
        self.removed
            .lock()
            .map(|removed| removed.clone())
            .unwrap_or_default()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.clear();
        }
        if let Ok(mut added) = self.added.lock() {
            added.clear();
        }
        if let Ok(mut removed) = self.removed.lock() {
            removed.clear();
        }
    }

    fn record(&self, target: Option<ConnectionId>, event: ServerEvent) -> Result<()> {
        let mut deliveries = self.deliveries.lock().map_err(|_| GameError::Internal {
            message: "Failed to acquire deliveries lock".to_string(),
        })?;
        deliveries.push(Delivery { target, event });
        Ok(())
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> Result<()> {
        self.record(Some(connection), event)
    }

    async fn broadcast(&self, event: ServerEvent) -> Result<()> {
        self.record(None, event)
    }

    async fn add_connection(&self, connection: ConnectionId) -> Result<bool> {
        let mut added = self.added.lock().map_err(|_| GameError::Internal {
            message: "Failed to acquire added lock".to_string(),
        })?;
        added.push(connection);
        Ok(true)
    }

    async fn remove_connection(&self, connection: ConnectionId) -> Result<bool> {
        let mut removed = self.removed.lock().map_err(|_| GameError::Internal {
            message: "Failed to acquire removed lock".to_string(),
        })?;
        removed.push(connection);
        Ok(true)
    }
}
