//! Newline-delimited text protocol between clients and the server

pub mod messages;

pub use messages::{ClientCommand, ServerEvent};
