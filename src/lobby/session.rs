//! State of the lobby the bot is running

use crate::lobby::queue::HostQueue;
use crate::types::{ChannelName, PlayerName};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Beatmap currently selected in the lobby
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beatmap {
    pub name: String,
    pub id: String,
}

/// Live lobby state guarded by the manager
#[derive(Debug, Clone)]
pub struct LobbySession {
    pub title: String,
    pub channel: Option<ChannelName>,
    pub queue: HostQueue,
    pub created_at: Option<DateTime<Utc>>,
    pub beatmap: Option<Beatmap>,
    pub match_in_progress: bool,
}

/// Point-in-time view of a lobby session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub title: String,
    pub channel: Option<ChannelName>,
    pub host_queue: Vec<PlayerName>,
    pub created_at: Option<DateTime<Utc>>,
    pub beatmap: Option<Beatmap>,
    pub match_in_progress: bool,
}

impl LobbySession {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            channel: None,
            queue: HostQueue::new(),
            created_at: None,
            beatmap: None,
            match_in_progress: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Whether `target` is the channel of the open lobby
    pub fn is_lobby_channel(&self, target: &str) -> bool {
        self.channel.as_deref() == Some(target)
    }

    /// Start tracking the lobby in `channel` with an empty queue
    pub fn open(&mut self, channel: impl Into<ChannelName>) {
        self.channel = Some(channel.into());
        self.queue.clear();
        self.created_at = Some(current_timestamp());
        self.beatmap = None;
        self.match_in_progress = false;
    }

    /// Forget the lobby; returns the channel it was in
    pub fn close(&mut self) -> Option<ChannelName> {
        self.queue.clear();
        self.created_at = None;
        self.beatmap = None;
        self.match_in_progress = false;
        self.channel.take()
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            title: self.title.clone(),
            channel: self.channel.clone(),
            host_queue: self.queue.players(),
            created_at: self.created_at,
            beatmap: self.beatmap.clone(),
            match_in_progress: self.match_in_progress,
        }
    }
}
