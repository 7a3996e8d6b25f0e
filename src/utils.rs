//! Utility functions for the game server

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique connection ID
pub fn generate_connection_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Join player names into the comma separated form used on the wire
pub fn join_names<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Name given to the n-th admitted player (1-based)
pub fn player_name(number: u32) -> String {
    format!("Player {}", number)
}
