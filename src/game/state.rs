//! Aggregate game state: deck, roster, turn pointer, and pending selection
//!
//! `GameState` only offers primitive mutations. The rules that decide when
//! to apply them live in the coordinator.

use crate::game::deck::Deck;
use crate::game::roster::{Player, Roster};
use crate::types::TurnId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    deck: Deck,
    roster: Roster,
    current_player_index: usize,
    pending_first_index: Option<usize>,
    turn_completed: bool,
    turn_epoch: u64,
}

impl GameState {
    /// Create a game with the first player on turn and no turn begun yet
    pub fn new(deck: Deck, roster: Roster) -> Self {
        Self {
            deck,
            roster,
            current_player_index: 0,
            pending_first_index: None,
            turn_completed: false,
            turn_epoch: 0,
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.roster.get(self.current_player_index)
    }

    pub fn pending_first_index(&self) -> Option<usize> {
        self.pending_first_index
    }

    /// Record the first card of a pair attempt
    pub fn set_pending_first(&mut self, index: usize) {
        self.pending_first_index = Some(index);
    }

    /// Clear and return the pending first card
    pub fn take_pending_first(&mut self) -> Option<usize> {
        self.pending_first_index.take()
    }

    pub fn turn_completed(&self) -> bool {
        self.turn_completed
    }

    /// Mark that the current turn resolved a pair attempt
    pub fn complete_turn(&mut self) {
        self.turn_completed = true;
    }

    /// Identity of the live turn
    pub fn current_turn(&self) -> TurnId {
        TurnId {
            player_index: self.current_player_index,
            epoch: self.turn_epoch,
        }
    }

    /// Whether `turn` still names the live, unresolved turn
    pub fn is_current_turn(&self, turn: TurnId) -> bool {
        !self.turn_completed && self.current_turn() == turn
    }

    /// Start a new turn for `player_index`; every call yields a fresh epoch.
    pub fn begin_turn(&mut self, player_index: usize) -> TurnId {
        self.current_player_index = if self.roster.is_empty() {
            0
        } else {
            player_index % self.roster.len()
        };
        self.turn_epoch += 1;
        self.turn_completed = false;
        self.current_turn()
    }

    /// Roster index that plays after the current player
    pub fn next_player_index(&self) -> usize {
        self.roster.next_index(self.current_player_index)
    }
}
