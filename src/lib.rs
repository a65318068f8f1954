//! Autohost - IRC client that runs an auto host rotate lobby
//!
//! This crate provides a line-oriented chat protocol engine with event
//! dispatch, and a lobby layer that follows system bot announcements to keep
//! a host rotation queue for osu! multiplayer lobbies.

pub mod bot;
pub mod config;
pub mod error;
pub mod events;
pub mod irc;
pub mod lobby;
pub mod metrics;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{BotError, Result};
pub use types::*;

// Re-export key components
pub use events::{handler_fn, Event, EventDispatcher, EventHandler};
pub use irc::{ChatSender, IrcClient};
pub use lobby::LobbyManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
