//! Common types used throughout the game server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name assigned to a participant at admission
pub type PlayerName = String;

/// Unique identifier for a live transport connection
pub type ConnectionId = Uuid;

/// Identity value shared by the two cards of a pair
pub type CardId = u32;

/// Identity of a single turn, used to bind a scheduled timeout to the turn
/// that armed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId {
    /// Roster index of the player owning the turn
    pub player_index: usize,
    /// Monotonically increasing turn counter
    pub epoch: u64,
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "turn#{}(player {})", self.epoch, self.player_index)
    }
}

/// Lifecycle phase of the game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Admitting players, no deck dealt yet
    Lobby,
    /// Deck dealt, turns running
    Active,
    /// Every pair matched (terminal)
    Finished,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Lobby => write!(f, "Lobby"),
            SessionPhase::Active => write!(f, "Active"),
            SessionPhase::Finished => write!(f, "Finished"),
        }
    }
}

/// A connection admitted into the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub connection_id: ConnectionId,
    pub player: PlayerName,
    pub connected_at: DateTime<Utc>,
}
