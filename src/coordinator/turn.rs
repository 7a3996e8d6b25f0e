//! Turn rules: flip resolution and timeout handling
//!
//! These functions mutate [`GameState`] and describe the events and the
//! follow-up turn. They never touch timers or connections, so every rule can
//! be tested synchronously.

use crate::game::GameState;
use crate::protocol::ServerEvent;
use crate::types::TurnId;

/// What should happen to the turn after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTurn {
    /// Turn continues: first card of a pair revealed
    Unchanged,
    /// Begin a fresh turn for this roster index
    Begin(usize),
    /// Every pair is matched
    GameOver,
}

/// Events produced by a step, in broadcast order, and the follow-up turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnStep {
    pub events: Vec<ServerEvent>,
    pub next: NextTurn,
}

/// Reasons a flip is dropped without any effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IgnoredFlip {
    #[error("not the player's turn")]
    NotYourTurn,
    #[error("card index {0} is out of bounds")]
    OutOfBounds(usize),
    #[error("card {0} is already matched")]
    AlreadyMatched(usize),
    #[error("card {0} is already face up")]
    SameCard(usize),
}

/// Apply a flip by `player` on card `index`
pub fn resolve_flip(
    game: &mut GameState,
    player: &str,
    index: usize,
) -> Result<TurnStep, IgnoredFlip> {
    let current = game.current_player_index();
    match game.current_player() {
        Some(owner) if owner.name == player => {}
        _ => return Err(IgnoredFlip::NotYourTurn),
    }
    let card_id = match game.deck().get(index) {
        None => return Err(IgnoredFlip::OutOfBounds(index)),
        Some(card) if card.matched => return Err(IgnoredFlip::AlreadyMatched(index)),
        Some(card) => card.id,
    };
    if game.pending_first_index() == Some(index) {
        return Err(IgnoredFlip::SameCard(index));
    }

    let revealed = ServerEvent::Flip { index, card_id };
    let Some(first) = game.take_pending_first() else {
        game.set_pending_first(index);
        return Ok(TurnStep {
            events: vec![revealed],
            next: NextTurn::Unchanged,
        });
    };

    let mut events = vec![revealed];
    let first_id = game.deck().get(first).map(|card| card.id);
    game.complete_turn();

    if first_id == Some(card_id) {
        game.deck_mut().mark_matched(first, index);
        let score = game.roster_mut().award_point(current).unwrap_or_default();
        events.push(ServerEvent::Match {
            player: player.to_string(),
            first,
            second: index,
            score,
        });

        if game.deck().all_matched() {
            if let Some(winners) = game.roster().winners() {
                events.push(ServerEvent::GameOver(winners));
            }
            return Ok(TurnStep {
                events,
                next: NextTurn::GameOver,
            });
        }
        return Ok(TurnStep {
            events,
            next: NextTurn::Begin(current),
        });
    }

    events.push(ServerEvent::NoMatch {
        player: player.to_string(),
        first,
        second: index,
    });
    Ok(TurnStep {
        events,
        next: NextTurn::Begin(game.next_player_index()),
    })
}

/// Expire `turn` if it is still the live turn
pub fn resolve_timeout(game: &mut GameState, turn: TurnId) -> Option<TurnStep> {
    if !game.is_current_turn(turn) {
        return None;
    }
    let player = game.current_player()?.name.clone();
    let index = game.take_pending_first();
    game.complete_turn();

    Some(TurnStep {
        events: vec![ServerEvent::Timeout { player, index }],
        next: NextTurn::Begin(game.next_player_index()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Deck, Roster, Winners};

    fn game(ids: &[u32], players: &[&str]) -> GameState {
        let mut game = GameState::new(
            Deck::from_ids(ids),
            Roster::from_names(players.iter().copied()),
        );
        game.begin_turn(0);
        game
    }

    /// Apply a flip and start the follow-up turn like the coordinator does
    fn play(game: &mut GameState, player: &str, index: usize) -> Vec<String> {
        let step = resolve_flip(game, player, index).unwrap();
        let mut lines: Vec<String> = step.events.iter().map(ToString::to_string).collect();
        if let NextTurn::Begin(next) = step.next {
            game.begin_turn(next);
            lines.push(format!("TURN {}", game.current_player().unwrap().name));
        }
        lines
    }

    #[test]
    fn test_mismatch_rotation_scenario() {
        let mut game = game(&[1, 0, 0, 1], &["A", "B"]);

        assert_eq!(play(&mut game, "A", 0), vec!["FLIP 0 1"]);
        assert_eq!(
            play(&mut game, "A", 1),
            vec!["FLIP 1 0", "NOMATCH A 0 1", "TURN B"]
        );
        assert_eq!(play(&mut game, "B", 2), vec!["FLIP 2 0"]);
        assert_eq!(
            play(&mut game, "B", 3),
            vec!["FLIP 3 1", "NOMATCH B 2 3", "TURN A"]
        );

        assert_eq!(game.current_player_index(), 0);
        assert_eq!(game.deck().matched_count(), 0);
        assert_eq!(game.pending_first_index(), None);
    }

    #[test]
    fn test_single_pair_game_over_scenario() {
        let mut game = game(&[0, 0], &["A"]);

        assert_eq!(play(&mut game, "A", 0), vec!["FLIP 0 0"]);
        let step = resolve_flip(&mut game, "A", 1).unwrap();
        let lines: Vec<String> = step.events.iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec!["FLIP 1 0", "MATCH A 0 1 1", "GAMEOVER A"]);
        assert_eq!(step.next, NextTurn::GameOver);
        assert!(game.deck().all_matched());
    }

    #[test]
    fn test_match_keeps_turn_and_scores_once() {
        let mut game = game(&[0, 1, 0, 1], &["A", "B"]);

        play(&mut game, "A", 0);
        assert_eq!(
            play(&mut game, "A", 2),
            vec!["FLIP 2 0", "MATCH A 0 2 1", "TURN A"]
        );
        assert_eq!(game.roster().get(0).unwrap().score, 1);
        assert!(!game.deck().is_selectable(0));
        assert!(!game.deck().is_selectable(2));

        assert_eq!(
            resolve_flip(&mut game, "A", 0),
            Err(IgnoredFlip::AlreadyMatched(0))
        );
    }

    #[test]
    fn test_tie_reported_in_roster_order() {
        let mut game = game(&[0, 0, 1, 1], &["A", "B"]);

        play(&mut game, "A", 0);
        play(&mut game, "A", 1);
        // A idles after scoring and the turn passes to B
        let idle = game.current_turn();
        let step = resolve_timeout(&mut game, idle).unwrap();
        if let NextTurn::Begin(next) = step.next {
            game.begin_turn(next);
        }
        assert_eq!(game.current_player().unwrap().name, "B");
        play(&mut game, "B", 2);
        let step = resolve_flip(&mut game, "B", 3).unwrap();

        assert_eq!(
            step.events.last(),
            Some(&ServerEvent::GameOver(Winners::Tie(vec![
                "A".to_string(),
                "B".to_string()
            ])))
        );
    }

    #[test]
    fn test_ignored_flips_leave_state_untouched() {
        let mut game = game(&[0, 1, 0, 1], &["A", "B"]);
        play(&mut game, "A", 1);
        let before = game.clone();

        assert_eq!(resolve_flip(&mut game, "B", 0), Err(IgnoredFlip::NotYourTurn));
        assert_eq!(resolve_flip(&mut game, "C", 0), Err(IgnoredFlip::NotYourTurn));
        assert_eq!(resolve_flip(&mut game, "A", 4), Err(IgnoredFlip::OutOfBounds(4)));
        assert_eq!(resolve_flip(&mut game, "A", 1), Err(IgnoredFlip::SameCard(1)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_timeout_with_pending_card() {
        let mut game = game(&[0, 1, 0, 1], &["A", "B"]);
        let turn = game.current_turn();
        play(&mut game, "A", 3);

        let step = resolve_timeout(&mut game, turn).unwrap();
        assert_eq!(
            step.events,
            vec![ServerEvent::Timeout {
                player: "A".into(),
                index: Some(3)
            }]
        );
        assert_eq!(step.next, NextTurn::Begin(1));
        assert_eq!(game.pending_first_index(), None);
        assert!(game.deck().is_selectable(3));
    }

    #[test]
    fn test_timeout_without_pending_card() {
        let mut game = game(&[0, 1, 0, 1], &["A", "B", "C"]);
        game.begin_turn(2);
        let turn = game.current_turn();

        let step = resolve_timeout(&mut game, turn).unwrap();
        assert_eq!(step.events[0].to_string(), "TIMEOUT C");
        assert_eq!(step.next, NextTurn::Begin(0));
    }

    #[test]
    fn test_stale_timeout_is_noop() {
        let mut game = game(&[0, 1, 0, 1], &["A", "B"]);
        let stale = game.current_turn();
        play(&mut game, "A", 0);
        play(&mut game, "A", 1);
        let before = game.clone();

        assert_eq!(resolve_timeout(&mut game, stale), None);
        assert_eq!(game, before);
    }

    #[test]
    fn test_resolved_turn_cannot_time_out() {
        let mut game = game(&[0, 1, 0, 1], &["A", "B"]);
        let turn = game.current_turn();
        resolve_flip(&mut game, "A", 0).unwrap();
        resolve_flip(&mut game, "A", 1).unwrap();

        // Resolved but the next turn has not begun yet
        assert_eq!(resolve_timeout(&mut game, turn), None);
    }
}
