//! Main application configuration
//!
//! This module defines the primary configuration structures for the memory
//! game server, including environment variable and TOML file loading and
//! validation.

use crate::config::game::GameSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub server: ServerSettings,
    pub game: GameSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// TCP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind to
    pub host: String,
    /// Port to listen on (0 picks an ephemeral port)
    pub port: u16,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "memory-rush".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 5,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

impl ServerSettings {
    /// Address string suitable for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse an environment variable into `target` if it is set
fn override_from_env<T: std::str::FromStr>(key: &str, target: &mut T) -> Result<()> {
    if let Ok(value) = env::var(key) {
        *target = value
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value))?;
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing keys fall back to defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| anyhow!("Invalid configuration file: {}", e))
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        override_from_env("SERVICE_NAME", &mut self.service.name)?;
        override_from_env("LOG_LEVEL", &mut self.service.log_level)?;
        override_from_env(
            "SHUTDOWN_TIMEOUT_SECONDS",
            &mut self.service.shutdown_timeout_seconds,
        )?;

        // Listener settings
        override_from_env("SERVER_HOST", &mut self.server.host)?;
        override_from_env("SERVER_PORT", &mut self.server.port)?;

        // Game rules
        override_from_env("NUM_PAIRS", &mut self.game.num_pairs)?;
        override_from_env("MIN_PLAYERS", &mut self.game.min_players)?;
        override_from_env("MAX_PLAYERS", &mut self.game.max_players)?;
        override_from_env("TURN_TIMEOUT_MS", &mut self.game.turn_timeout_ms)?;
        override_from_env("START_GRACE_MS", &mut self.game.start_grace_ms)?;

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.server.host.is_empty() {
        return Err(anyhow!("Server host cannot be empty"));
    }

    // Validate game rules
    if config.game.num_pairs == 0 {
        return Err(anyhow!("Number of pairs must be greater than 0"));
    }
    if config.game.min_players == 0 {
        return Err(anyhow!("Minimum player count must be greater than 0"));
    }
    if config.game.max_players < config.game.min_players {
        return Err(anyhow!(
            "Maximum player count ({}) cannot be below minimum ({})",
            config.game.max_players,
            config.game.min_players
        ));
    }
    if config.game.turn_timeout_ms == 0 {
        return Err(anyhow!("Turn timeout must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.server.bind_address(), "0.0.0.0:8090");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9100

            [game]
            num_pairs = 8
            max_players = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.game.num_pairs, 8);
        assert_eq!(config.game.max_players, 3);
        assert_eq!(config.game.min_players, 2);
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(AppConfig::from_toml_str("[game]\nnum_pairs = \"many\"").is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.game.num_pairs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.game.min_players = 3;
        config.game.max_players = 2;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.game.turn_timeout_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.game.min_players = 0;
        assert!(validate_config(&config).is_err());
    }
}
