//! Configuration management for the autohost client
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values.

pub mod app;

// Re-export commonly used types
pub use app::{
    require_credentials, validate_config, AppConfig, IrcSettings, LobbySettings, ServiceSettings,
};
