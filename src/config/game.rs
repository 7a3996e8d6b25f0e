//! Game rule configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rules for a single game session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Number of card pairs dealt, independent of player count
    pub num_pairs: u32,
    /// Roster size that arms the start grace delay
    pub min_players: usize,
    /// Roster size that starts the game immediately
    pub max_players: usize,
    /// Time a player has to finish a turn, in milliseconds
    pub turn_timeout_ms: u64,
    /// Delay between reaching `min_players` and the automatic start
    pub start_grace_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            num_pairs: 16,
            min_players: 2,
            max_players: 4,
            turn_timeout_ms: 30_000, // 30 seconds
            start_grace_ms: 5_000,   // 5 seconds
        }
    }
}

impl GameSettings {
    /// Get the turn timeout as a Duration
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    /// Get the start grace delay as a Duration
    pub fn start_grace(&self) -> Duration {
        Duration::from_millis(self.start_grace_ms)
    }

    /// Total number of cards on the table
    pub fn total_cards(&self) -> usize {
        self.num_pairs as usize * 2
    }
}
