//! Common types used throughout the client

use crate::events::Event;
use crate::irc::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Player nickname as announced by the system bot
pub type PlayerName = String;

/// Channel name of a lobby (e.g. `#mp_123456`)
pub type ChannelName = String;

/// Coarse events raised by the protocol engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEventKind {
    Init,
    Message,
    Shutdown,
}

impl fmt::Display for ClientEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientEventKind::Init => write!(f, "init"),
            ClientEventKind::Message => write!(f, "message"),
            ClientEventKind::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Login handshake was sent and the receive loop is starting
    Init,
    /// A response-class line was received
    Message(Message),
    /// The receive loop ended; the connection closes after handlers finish
    Shutdown,
}

impl Event for ClientEvent {
    type Kind = ClientEventKind;

    fn kind(&self) -> ClientEventKind {
        match self {
            ClientEvent::Init => ClientEventKind::Init,
            ClientEvent::Message(_) => ClientEventKind::Message,
            ClientEvent::Shutdown => ClientEventKind::Shutdown,
        }
    }
}

/// How a match came to an end
///
/// Both reasons are handled the same way today; they are kept apart so the
/// two announcements stay distinguishable in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchEndReason {
    Finished,
    Aborted,
}

impl fmt::Display for MatchEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchEndReason::Finished => write!(f, "finished"),
            MatchEndReason::Aborted => write!(f, "aborted"),
        }
    }
}

/// Fine-grained events raised by the lobby layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobbyEventKind {
    Lobby,
    Join,
    Leave,
    Chat,
    Ready,
    MatchStart,
    MatchEnd,
    HostNew,
    HostChoosing,
    BeatmapChange,
    SystemMessage,
}

impl LobbyEventKind {
    /// Every lobby event kind, in declaration order
    pub const ALL: [LobbyEventKind; 11] = [
        LobbyEventKind::Lobby,
        LobbyEventKind::Join,
        LobbyEventKind::Leave,
        LobbyEventKind::Chat,
        LobbyEventKind::Ready,
        LobbyEventKind::MatchStart,
        LobbyEventKind::MatchEnd,
        LobbyEventKind::HostNew,
        LobbyEventKind::HostChoosing,
        LobbyEventKind::BeatmapChange,
        LobbyEventKind::SystemMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LobbyEventKind::Lobby => "lobby",
            LobbyEventKind::Join => "join",
            LobbyEventKind::Leave => "leave",
            LobbyEventKind::Chat => "chat",
            LobbyEventKind::Ready => "ready",
            LobbyEventKind::MatchStart => "match_start",
            LobbyEventKind::MatchEnd => "match_end",
            LobbyEventKind::HostNew => "host_new",
            LobbyEventKind::HostChoosing => "host_choosing",
            LobbyEventKind::BeatmapChange => "beatmap_change",
            LobbyEventKind::SystemMessage => "system_message",
        }
    }
}

impl fmt::Display for LobbyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LobbyEvent {
    /// The lobby channel was learned from our own JOIN confirmation
    Lobby { channel: ChannelName },
    Join {
        channel: ChannelName,
        player: PlayerName,
        slot: u16,
    },
    Leave {
        channel: ChannelName,
        player: PlayerName,
    },
    /// Chat from anyone other than the system bot
    Chat {
        channel: ChannelName,
        player: PlayerName,
        message: String,
    },
    Ready { channel: ChannelName },
    MatchStart { channel: ChannelName },
    MatchEnd {
        channel: ChannelName,
        reason: MatchEndReason,
    },
    HostNew {
        channel: ChannelName,
        player: PlayerName,
    },
    HostChoosing { channel: ChannelName },
    BeatmapChange {
        channel: ChannelName,
        name: String,
        id: String,
    },
    /// System bot text that matched no known announcement
    SystemMessage { channel: ChannelName, text: String },
}

impl LobbyEvent {
    /// Channel the event happened in
    pub fn channel(&self) -> &str {
        match self {
            LobbyEvent::Lobby { channel }
            | LobbyEvent::Join { channel, .. }
            | LobbyEvent::Leave { channel, .. }
            | LobbyEvent::Chat { channel, .. }
            | LobbyEvent::Ready { channel }
            | LobbyEvent::MatchStart { channel }
            | LobbyEvent::MatchEnd { channel, .. }
            | LobbyEvent::HostNew { channel, .. }
            | LobbyEvent::HostChoosing { channel }
            | LobbyEvent::BeatmapChange { channel, .. }
            | LobbyEvent::SystemMessage { channel, .. } => channel,
        }
    }
}

impl Event for LobbyEvent {
    type Kind = LobbyEventKind;

    fn kind(&self) -> LobbyEventKind {
        match self {
            LobbyEvent::Lobby { .. } => LobbyEventKind::Lobby,
            LobbyEvent::Join { .. } => LobbyEventKind::Join,
            LobbyEvent::Leave { .. } => LobbyEventKind::Leave,
            LobbyEvent::Chat { .. } => LobbyEventKind::Chat,
            LobbyEvent::Ready { .. } => LobbyEventKind::Ready,
            LobbyEvent::MatchStart { .. } => LobbyEventKind::MatchStart,
            LobbyEvent::MatchEnd { .. } => LobbyEventKind::MatchEnd,
            LobbyEvent::HostNew { .. } => LobbyEventKind::HostNew,
            LobbyEvent::HostChoosing { .. } => LobbyEventKind::HostChoosing,
            LobbyEvent::BeatmapChange { .. } => LobbyEventKind::BeatmapChange,
            LobbyEvent::SystemMessage { .. } => LobbyEventKind::SystemMessage,
        }
    }
}
