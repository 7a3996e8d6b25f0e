//! TCP transport: accept loop and per-connection workers

pub mod connection;
pub mod listener;

pub use connection::handle_connection;
pub use listener::GameServer;
