//! Memory Rush - Turn coordinator for multiplayer memory card games
//!
//! This crate hosts a single shared game session over a newline-delimited
//! TCP protocol: lobby admission, an authoritative turn state machine, and
//! per-turn timeouts that race safely with player actions.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod lobby;
pub mod protocol;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{GameError, Result};
pub use types::*;

// Re-export key components
pub use coordinator::{SessionSnapshot, SessionStats, TurnCoordinator};
pub use protocol::{ClientCommand, ServerEvent};
pub use registry::{Broadcaster, ConnectionRegistry};
pub use server::GameServer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
