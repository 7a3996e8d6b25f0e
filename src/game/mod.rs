//! Game model: deck, roster, and the aggregate game state

pub mod deck;
pub mod roster;
pub mod state;

pub use deck::{Card, Deck, FixedPermutation, RandomShuffle, Shuffle};
pub use roster::{Player, Roster, Winners};
pub use state::GameState;
