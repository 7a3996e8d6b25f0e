//! Deck model: paired cards, shuffling, and match tracking

use crate::types::CardId;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single card on the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub matched: bool,
}

impl Card {
    pub fn new(id: CardId) -> Self {
        Self { id, matched: false }
    }
}

/// Strategy used to order a freshly built deck
pub trait Shuffle: Send + Sync {
    /// Reorder the cards in place
    fn shuffle(&self, cards: &mut [Card]);
}

/// Uniform random permutation (Fisher-Yates through `rand`)
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomShuffle;

impl Shuffle for RandomShuffle {
    fn shuffle(&self, cards: &mut [Card]) {
        cards.shuffle(&mut rand::thread_rng());
    }
}

/// Applies a fixed permutation: position `i` receives the card that was at
/// `permutation[i]` in the unshuffled deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPermutation {
    permutation: Vec<usize>,
}

impl FixedPermutation {
    pub fn new(permutation: Vec<usize>) -> Self {
        Self { permutation }
    }

    /// Build the permutation that lays the unshuffled deck out as `ids`.
    ///
    /// The unshuffled deck holds id `k` at positions `2k` and `2k + 1`.
    /// Returns `None` unless every id in `0..ids.len()/2` appears exactly
    /// twice.
    pub fn from_layout(ids: &[CardId]) -> Option<Self> {
        if ids.len() % 2 != 0 {
            return None;
        }
        let pairs = ids.len() / 2;
        let mut used = vec![0usize; pairs];
        let mut permutation = Vec::with_capacity(ids.len());

        for &id in ids {
            let slot = used.get_mut(id as usize)?;
            if *slot >= 2 {
                return None;
            }
            permutation.push(id as usize * 2 + *slot);
            *slot += 1;
        }

        Some(Self { permutation })
    }

    fn is_valid_for(&self, len: usize) -> bool {
        if self.permutation.len() != len {
            return false;
        }
        let mut seen = vec![false; len];
        self.permutation.iter().all(|&source| match seen.get_mut(source) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        })
    }
}

impl Shuffle for FixedPermutation {
    fn shuffle(&self, cards: &mut [Card]) {
        if !self.is_valid_for(cards.len()) {
            warn!(
                "Ignoring fixed permutation of length {} for a deck of {} cards",
                self.permutation.len(),
                cards.len()
            );
            return;
        }
        let original = cards.to_vec();
        for (slot, &source) in cards.iter_mut().zip(&self.permutation) {
            *slot = original[source].clone();
        }
    }
}

/// The full set of cards on the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Build `2 * num_pairs` cards, two per id, and order them with `shuffler`
    pub fn new(num_pairs: u32, shuffler: &dyn Shuffle) -> Self {
        let mut cards: Vec<Card> = (0..num_pairs)
            .flat_map(|id| [Card::new(id), Card::new(id)])
            .collect();
        shuffler.shuffle(&mut cards);
        Self { cards }
    }

    /// Build a deck with an explicit layout of ids
    pub fn from_ids(ids: &[CardId]) -> Self {
        Self {
            cards: ids.iter().copied().map(Card::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Whether `index` names a card that can still be flipped
    pub fn is_selectable(&self, index: usize) -> bool {
        self.cards.get(index).is_some_and(|card| !card.matched)
    }

    /// Mark both cards of a resolved pair as matched
    pub fn mark_matched(&mut self, first: usize, second: usize) {
        for index in [first, second] {
            if let Some(card) = self.cards.get_mut(index) {
                card.matched = true;
            }
        }
    }

    /// True iff every card is matched
    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(|card| card.matched)
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|card| card.matched).count()
    }
}
