//! Configuration management for the memory game server
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;
pub mod game;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServerSettings, ServiceSettings};
pub use game::GameSettings;
