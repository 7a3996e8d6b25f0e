//! Pre-game admission gate
//!
//! The lobby hands out player names in arrival order and decides when enough
//! players are present for the coordinator to start the game.

use crate::config::GameSettings;
use crate::error::{GameError, Result};
use crate::types::PlayerName;
use crate::utils::player_name;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Player count thresholds for starting a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    /// Roster size that schedules the grace start
    pub min_players: usize,
    /// Roster size that starts the game right away
    pub max_players: usize,
}

impl From<&GameSettings> for AdmissionPolicy {
    fn from(settings: &GameSettings) -> Self {
        Self {
            min_players: settings.min_players,
            max_players: settings.max_players,
        }
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::from(&GameSettings::default())
    }
}

/// What an admission asks the coordinator to do about starting the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTrigger {
    None,
    /// Minimum reached: start once the grace delay has passed
    AfterGrace,
    /// Lobby is full: start now
    Immediately,
}

/// Result of a successful admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub name: PlayerName,
    /// Every admitted player, in admission order
    pub players: Vec<PlayerName>,
    pub start: StartTrigger,
}

/// Lobby state for a single session
#[derive(Debug, Clone)]
pub struct Lobby {
    policy: AdmissionPolicy,
    players: Vec<PlayerName>,
    next_number: u32,
    closed: bool,
}

impl Lobby {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            policy,
            players: Vec::new(),
            next_number: 1,
            closed: false,
        }
    }

    /// Admit the next player, or explain why the connection must be turned away
    pub fn admit(&mut self) -> Result<Admission> {
        if self.closed {
            return Err(GameError::GameInProgress.into());
        }
        if self.is_full() {
            return Err(GameError::LobbyFull.into());
        }

        let name = player_name(self.next_number);
        self.next_number += 1;
        self.players.push(name.clone());

        let start = if self.players.len() >= self.policy.max_players {
            StartTrigger::Immediately
        } else if self.players.len() == self.policy.min_players {
            StartTrigger::AfterGrace
        } else {
            StartTrigger::None
        };
        debug!(
            "Admitted {} ({}/{} players, start: {:?})",
            name,
            self.players.len(),
            self.policy.max_players,
            start
        );

        Ok(Admission {
            name,
            players: self.players.clone(),
            start,
        })
    }

    /// Stop admitting; called when the game starts
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.policy.max_players
    }

    /// Whether the lobby holds enough players and has not started yet
    pub fn can_start(&self) -> bool {
        !self.closed && self.players.len() >= self.policy.min_players
    }

    pub fn players(&self) -> &[PlayerName] {
        &self.players
    }
}
