//! Player roster: fixed-at-start participant list with scores

use crate::types::PlayerName;
use serde::{Deserialize, Serialize};

/// A participant and their current score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: PlayerName,
    pub score: u32,
}

impl Player {
    pub fn new(name: impl Into<PlayerName>) -> Self {
        Self {
            name: name.into(),
            score: 0,
        }
    }
}

/// Outcome of a finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winners {
    /// Exactly one player holds the maximum score
    Single(PlayerName),
    /// Several players share the maximum score, in roster order
    Tie(Vec<PlayerName>),
}

/// Ordered list of players, fixed when the game starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        Self {
            players: names.into_iter().map(Player::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn names(&self) -> Vec<PlayerName> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    /// Add one point to the player at `index`, returning the new score
    pub fn award_point(&mut self, index: usize) -> Option<u32> {
        let player = self.players.get_mut(index)?;
        player.score += 1;
        Some(player.score)
    }

    /// Index following `index` in round-robin order
    pub fn next_index(&self, index: usize) -> usize {
        if self.players.is_empty() {
            0
        } else {
            (index + 1) % self.players.len()
        }
    }

    /// Every player whose score equals the maximum, in roster order
    pub fn leaders(&self) -> Vec<&Player> {
        let Some(best) = self.players.iter().map(|p| p.score).max() else {
            return Vec::new();
        };
        self.players.iter().filter(|p| p.score == best).collect()
    }

    /// Winners of the game; `None` only for an empty roster
    pub fn winners(&self) -> Option<Winners> {
        let leaders = self.leaders();
        match leaders.as_slice() {
            [] => None,
            [only] => Some(Winners::Single(only.name.clone())),
            tied => Some(Winners::Tie(tied.iter().map(|p| p.name.clone()).collect())),
        }
    }
}
