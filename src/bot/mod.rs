//! Bots built on top of the lobby layer
//!
//! A bot registers handlers for lobby events on a [`crate::lobby::LobbyManager`]
//! before the client starts.

pub mod logger;

pub use logger::LoggingBot;
