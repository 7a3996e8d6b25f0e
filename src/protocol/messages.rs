//! Line protocol message definitions and encoding
//!
//! Every message is a single UTF-8 line. Server events render through
//! `Display`; client lines parse through [`ClientCommand::parse`].

use crate::game::roster::Winners;
use crate::types::{CardId, PlayerName};
use crate::utils::join_names;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client command prefixes
pub const FLIP_PREFIX: &str = "FLIP:";
pub const CHAT_PREFIX: &str = "CHAT:";
pub const QUIT_COMMAND: &str = "QUIT";

/// Event sent from the server to connected clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerEvent {
    /// Identity assigned to the receiving connection
    Name(PlayerName),
    /// Full roster in admission order
    Players(Vec<PlayerName>),
    /// Game begins with this many cards on the table
    Start { total_cards: usize },
    /// Turn ownership announcement
    Turn(PlayerName),
    /// A card was revealed
    Flip { index: usize, card_id: CardId },
    /// A pair was found
    Match {
        player: PlayerName,
        first: usize,
        second: usize,
        score: u32,
    },
    /// A pair attempt failed
    NoMatch {
        player: PlayerName,
        first: usize,
        second: usize,
    },
    /// A turn expired; `index` names an open card to hide again
    Timeout {
        player: PlayerName,
        index: Option<usize>,
    },
    /// Terminal event
    GameOver(Winners),
    /// Relayed chat line
    Chat { player: PlayerName, text: String },
    /// Admission or protocol-level error
    Error(String),
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerEvent::Name(name) => write!(f, "NAME {}", name),
            ServerEvent::Players(names) => write!(f, "PLAYERS {}", join_names(names)),
            ServerEvent::Start { total_cards } => write!(f, "START {}", total_cards),
            ServerEvent::Turn(name) => write!(f, "TURN {}", name),
            ServerEvent::Flip { index, card_id } => write!(f, "FLIP {} {}", index, card_id),
            ServerEvent::Match {
                player,
                first,
                second,
                score,
            } => write!(f, "MATCH {} {} {} {}", player, first, second, score),
            ServerEvent::NoMatch {
                player,
                first,
                second,
            } => write!(f, "NOMATCH {} {} {}", player, first, second),
            ServerEvent::Timeout {
                player,
                index: Some(index),
            } => write!(f, "TIMEOUT {} {}", player, index),
            ServerEvent::Timeout { player, index: None } => write!(f, "TIMEOUT {}", player),
            ServerEvent::GameOver(Winners::Single(name)) => write!(f, "GAMEOVER {}", name),
            ServerEvent::GameOver(Winners::Tie(names)) => {
                write!(f, "GAMEOVER TIE {}", join_names(names))
            }
            ServerEvent::Chat { player, text } => write!(f, "CHAT {}: {}", player, text),
            ServerEvent::Error(text) => write!(f, "ERROR {}", text),
        }
    }
}

impl ServerEvent {
    /// Wire form including the trailing newline
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }

    /// Short event name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Name(_) => "NAME",
            ServerEvent::Players(_) => "PLAYERS",
            ServerEvent::Start { .. } => "START",
            ServerEvent::Turn(_) => "TURN",
            ServerEvent::Flip { .. } => "FLIP",
            ServerEvent::Match { .. } => "MATCH",
            ServerEvent::NoMatch { .. } => "NOMATCH",
            ServerEvent::Timeout { .. } => "TIMEOUT",
            ServerEvent::GameOver(_) => "GAMEOVER",
            ServerEvent::Chat { .. } => "CHAT",
            ServerEvent::Error(_) => "ERROR",
        }
    }
}

/// Command received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Flip(usize),
    Chat(String),
    Quit,
}

impl ClientCommand {
    /// Parse one inbound line.
    ///
    /// Returns `None` for a `FLIP:` line whose index does not parse; such
    /// lines are dropped without a reply. Unknown lines are chat.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(payload) = line.strip_prefix(FLIP_PREFIX) {
            return payload.trim().parse().ok().map(ClientCommand::Flip);
        }
        if line == QUIT_COMMAND {
            return Some(ClientCommand::Quit);
        }
        if let Some(text) = line.strip_prefix(CHAT_PREFIX) {
            return Some(ClientCommand::Chat(text.to_string()));
        }
        Some(ClientCommand::Chat(line.to_string()))
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCommand::Flip(index) => write!(f, "{}{}", FLIP_PREFIX, index),
            ClientCommand::Chat(text) => write!(f, "{}{}", CHAT_PREFIX, text),
            ClientCommand::Quit => write!(f, "{}", QUIT_COMMAND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_event_wire_text() {
        let cases = vec![
            (ServerEvent::Name("Player 1".into()), "NAME Player 1"),
            (
                ServerEvent::Players(vec!["Player 1".into(), "Player 2".into()]),
                "PLAYERS Player 1,Player 2",
            ),
            (ServerEvent::Start { total_cards: 32 }, "START 32"),
            (ServerEvent::Turn("Player 2".into()), "TURN Player 2"),
            (ServerEvent::Flip { index: 3, card_id: 7 }, "FLIP 3 7"),
            (
                ServerEvent::Match {
                    player: "A".into(),
                    first: 0,
                    second: 1,
                    score: 1,
                },
                "MATCH A 0 1 1",
            ),
            (
                ServerEvent::NoMatch {
                    player: "B".into(),
                    first: 2,
                    second: 3,
                },
                "NOMATCH B 2 3",
            ),
            (
                ServerEvent::Timeout {
                    player: "A".into(),
                    index: Some(5),
                },
                "TIMEOUT A 5",
            ),
            (
                ServerEvent::Timeout {
                    player: "A".into(),
                    index: None,
                },
                "TIMEOUT A",
            ),
            (
                ServerEvent::GameOver(Winners::Single("A".into())),
                "GAMEOVER A",
            ),
            (
                ServerEvent::GameOver(Winners::Tie(vec!["A".into(), "C".into()])),
                "GAMEOVER TIE A,C",
            ),
            (
                ServerEvent::Chat {
                    player: "A".into(),
                    text: "hello there".into(),
                },
                "CHAT A: hello there",
            ),
            (
                ServerEvent::Error("Game lobby full. Connection closed.".into()),
                "ERROR Game lobby full. Connection closed.",
            ),
        ];

        for (event, expected) in cases {
            assert_eq!(event.to_string(), expected);
            assert_eq!(event.to_line(), format!("{}\n", expected));
        }
    }

    #[test]
    fn test_parse_flip() {
        assert_eq!(ClientCommand::parse("FLIP:4"), Some(ClientCommand::Flip(4)));
        assert_eq!(ClientCommand::parse("FLIP: 12 "), Some(ClientCommand::Flip(12)));
        assert_eq!(ClientCommand::parse("FLIP:7\r"), Some(ClientCommand::Flip(7)));
    }

    #[test]
    fn test_malformed_flip_is_dropped() {
        assert_eq!(ClientCommand::parse("FLIP:abc"), None);
        assert_eq!(ClientCommand::parse("FLIP:"), None);
        assert_eq!(ClientCommand::parse("FLIP:-1"), None);
    }

    #[test]
    fn test_parse_quit_and_chat() {
        assert_eq!(ClientCommand::parse("QUIT"), Some(ClientCommand::Quit));
        assert_eq!(
            ClientCommand::parse("CHAT:good luck"),
            Some(ClientCommand::Chat("good luck".into()))
        );
        // Anything else is treated as chat text
        assert_eq!(
            ClientCommand::parse("hello"),
            Some(ClientCommand::Chat("hello".into()))
        );
        assert_eq!(
            ClientCommand::parse("QUIT now"),
            Some(ClientCommand::Chat("QUIT now".into()))
        );
    }

    #[test]
    fn test_client_command_display_parses_back() {
        for command in [
            ClientCommand::Flip(9),
            ClientCommand::Chat("hi".into()),
            ClientCommand::Quit,
        ] {
            assert_eq!(ClientCommand::parse(&command.to_string()), Some(command));
        }
    }
}
