//! Line-oriented chat protocol engine
//!
//! This module owns the connection, parses received lines, answers
//! keepalives and feeds everything else to registered event handlers.

pub mod client;
pub mod command;
pub mod message;
pub mod sender;
pub mod transport;

// Re-export commonly used types
pub use client::{ClientState, IrcClient};
pub use command::Command;
pub use message::{Directive, Message, Parsed};
pub use sender::{ChatSender, IrcSender, RecordingChatSender};
pub use transport::{LineWriter, Transport};
