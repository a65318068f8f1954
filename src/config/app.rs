//! Main application configuration
//!
//! This module defines the configuration structures for the autohost client,
//! including environment variable and TOML file loading and validation.

use crate::error::BotError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub irc: IrcSettings,
    pub lobby: LobbySettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for the health and metrics endpoint; disabled when unset
    pub metrics_port: Option<u16>,
}

/// Server connection and login settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrcSettings {
    pub host: String,
    pub port: u16,
    /// Nickname to log in with
    pub username: String,
    /// Server password, sent in clear text during login
    pub password: String,
}

/// Lobby behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbySettings {
    /// Title passed to `!mp make`
    pub title: String,
    /// Nickname of the bot that runs lobbies and announces their events
    pub system_bot: String,
    /// Suffix the server appends to every nickname
    pub identity_suffix: String,
    /// Prefix of lobby commands relayed on behalf of players
    pub command_prefix: String,
    /// Send `!mp password` once the lobby is open
    pub clear_password: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "autohost".to_string(),
            log_level: "info".to_string(),
            metrics_port: None,
        }
    }
}

impl Default for IrcSettings {
    fn default() -> Self {
        Self {
            host: "irc.ppy.sh".to_string(),
            port: 6667,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for IrcSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrcSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            title: "Auto Host Rotate".to_string(),
            system_bot: "BanchoBot".to_string(),
            identity_suffix: "!cho@ppy.sh".to_string(),
            command_prefix: "!mp".to_string(),
            clear_password: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables override it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(port) = env::var("METRICS_PORT") {
            self.service.metrics_port = Some(
                port.parse()
                    .map_err(|_| anyhow!("Invalid METRICS_PORT value: {}", port))?,
            );
        }

        // Connection settings
        if let Ok(host) = env::var("IRC_HOST") {
            self.irc.host = host;
        }
        if let Ok(port) = env::var("IRC_PORT") {
            self.irc.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid IRC_PORT value: {}", port))?;
        }
        if let Ok(username) = env::var("IRC_USERNAME") {
            self.irc.username = username;
        }
        if let Ok(password) = env::var("IRC_PASSWORD") {
            self.irc.password = password;
        }

        // Lobby settings
        if let Ok(title) = env::var("LOBBY_NAME") {
            self.lobby.title = title;
        }
        if let Ok(system_bot) = env::var("LOBBY_SYSTEM_BOT") {
            self.lobby.system_bot = system_bot;
        }
        if let Ok(clear) = env::var("LOBBY_CLEAR_PASSWORD") {
            self.lobby.clear_password = clear
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_CLEAR_PASSWORD value: {}", clear))?;
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> anyhow::Error {
    BotError::Configuration {
        message: message.into(),
    }
    .into()
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(invalid(format!(
                "Invalid log level: {}",
                config.service.log_level
            )))
        }
    }

    // Validate ports
    if config.service.metrics_port == Some(0) {
        return Err(invalid("Metrics port cannot be 0"));
    }
    if config.irc.port == 0 {
        return Err(invalid("IRC port cannot be 0"));
    }

    // Validate connection settings
    if config.irc.host.is_empty() {
        return Err(invalid("IRC host cannot be empty"));
    }
    if config.irc.username.contains(char::is_whitespace) {
        return Err(invalid("IRC username cannot contain whitespace"));
    }

    // Validate lobby settings
    if config.lobby.title.trim().is_empty() {
        return Err(invalid("Lobby title cannot be empty"));
    }
    if config.lobby.system_bot.is_empty() {
        return Err(invalid("System bot name cannot be empty"));
    }
    if config.lobby.command_prefix.is_empty() {
        return Err(invalid("Command prefix cannot be empty"));
    }
    for (name, value) in [
        ("Lobby title", &config.lobby.title),
        ("IRC username", &config.irc.username),
        ("IRC password", &config.irc.password),
    ] {
        if value.contains(['\r', '\n']) {
            return Err(invalid(format!("{} cannot contain line breaks", name)));
        }
    }

    Ok(())
}

/// Check that the settings needed to log in are present
pub fn require_credentials(config: &AppConfig) -> Result<()> {
    if config.irc.username.is_empty() {
        return Err(invalid("IRC username is required (set IRC_USERNAME)"));
    }
    if config.irc.password.is_empty() {
        return Err(invalid("IRC password is required (set IRC_PASSWORD)"));
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
        assert_eq!(config.irc.host, "irc.ppy.sh");
        assert_eq!(config.irc.port, 6667);
        assert_eq!(config.lobby.system_bot, "BanchoBot");
        assert!(config.service.metrics_port.is_none());
    }

    #[test]
    fn test_from_toml_with_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [irc]
            username = "autobot"
            password = "secret"

            [lobby]
            title = "5* auto rotate"
            clear_password = false
            "#,
        )
        .unwrap();

        assert_eq!(config.irc.username, "autobot");
        assert_eq!(config.irc.host, "irc.ppy.sh");
        assert_eq!(config.lobby.title, "5* auto rotate");
        assert!(!config.lobby.clear_password);
        assert_eq!(config.lobby.command_prefix, "!mp");
        assert_eq!(config.service.log_level, "info");
        assert!(require_credentials(&config).is_ok());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.lobby.title = "   ".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.irc.password = "pw\r\nQUIT".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.service.metrics_port = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_credentials() {
        let config = AppConfig::default();
        let err = require_credentials(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::Configuration { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = IrcSettings {
            password: "hunter2".to_string(),
            ..IrcSettings::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("irc.ppy.sh"));
    }
}
