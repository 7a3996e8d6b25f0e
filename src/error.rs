//! Error types for the memory game server
//!
//! Domain failures are modelled with thiserror and propagated through
//! anyhow, so callers can either match on [`GameError`] or just report.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific game scenarios
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Game already in progress. Connection closed.")]
    GameInProgress,

    #[error("Game lobby full. Connection closed.")]
    LobbyFull,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}
