//! Lobby Controller configuration.
//!
//! Configuration is loaded from environment variables. Nothing here is
//! secret, so `Debug` is derived.

use crate::registry::RegistryLimits;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default number of lobbies that may be open at once.
pub const DEFAULT_MAX_LOBBIES: u32 = 5;

/// Default roster size per lobby.
pub const DEFAULT_MAX_PLAYERS: usize = 8;

/// Default channel commands are accepted in.
pub const DEFAULT_COMMANDS_CHANNEL: &str = "customs_bot_commands";

/// Default channel status displays are posted to.
pub const DEFAULT_STATUS_CHANNEL: &str = "lobby_status";

/// Default category voice channels are created under.
pub const DEFAULT_CATEGORY_NAME: &str = "Lobbies";

/// Default command prefix.
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Default health endpoint bind address.
pub const DEFAULT_HEALTH_BIND_ADDRESS: &str = "0.0.0.0:8081";

/// Default time allowed for releasing resources on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECONDS: u64 = 10;

/// Default LC instance ID prefix.
pub const DEFAULT_LC_ID_PREFIX: &str = "lc";

/// Lobby Controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum concurrently open lobbies (default: 5).
    pub max_lobbies: u32,

    /// Maximum players per lobby before sign-ups queue (default: 8).
    pub max_players: usize,

    /// Channel in which commands are accepted.
    pub commands_channel: String,

    /// Channel holding the per-lobby status displays.
    pub status_channel: String,

    /// Category under which lobby voice channels are created.
    pub category_name: String,

    /// Prefix that marks a chat message as a command.
    pub command_prefix: String,

    /// Health endpoint bind address (default: "0.0.0.0:8081").
    pub health_bind_address: String,

    /// How long shutdown waits for drain effects to finish.
    pub shutdown_timeout_seconds: u64,

    /// Unique identifier for this LC instance.
    pub lc_id: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let string_or = |name: &str, default: &str| {
            vars.get(name)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let max_lobbies = parse_positive(vars, "LC_MAX_LOBBIES", DEFAULT_MAX_LOBBIES)?;
        let max_players = parse_positive(vars, "LC_MAX_PLAYERS", DEFAULT_MAX_PLAYERS)?;
        let shutdown_timeout_seconds = parse_positive(
            vars,
            "LC_SHUTDOWN_TIMEOUT_SECONDS",
            DEFAULT_SHUTDOWN_TIMEOUT_SECONDS,
        )?;

        let command_prefix = string_or("LC_COMMAND_PREFIX", DEFAULT_COMMAND_PREFIX);
        if command_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "LC_COMMAND_PREFIX must not be empty".to_string(),
            ));
        }

        let lc_id = vars.get("LC_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_LC_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            max_lobbies,
            max_players,
            commands_channel: string_or("LC_COMMANDS_CHANNEL", DEFAULT_COMMANDS_CHANNEL),
            status_channel: string_or("LC_STATUS_CHANNEL", DEFAULT_STATUS_CHANNEL),
            category_name: string_or("LC_CATEGORY_NAME", DEFAULT_CATEGORY_NAME),
            command_prefix,
            health_bind_address: string_or("LC_HEALTH_BIND_ADDRESS", DEFAULT_HEALTH_BIND_ADDRESS),
            shutdown_timeout_seconds,
            lc_id,
        })
    }

    /// Registry limits derived from this configuration.
    #[must_use]
    pub fn registry_limits(&self) -> RegistryLimits {
        RegistryLimits {
            max_lobbies: self.max_lobbies,
            max_players: self.max_players,
        }
    }
}

/// Parse a strictly positive number, falling back to `default` when unset.
fn parse_positive<T>(vars: &HashMap<String, String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{name} must be a number, got {raw:?}")))?;

    if value == T::default() {
        return Err(ConfigError::InvalidValue(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(value)
}
