//! Bot that reports every lobby event through the log

use crate::error::Result;
use crate::events::{Event, EventHandler};
use crate::lobby::LobbyManager;
use crate::types::{LobbyEvent, LobbyEventKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Logs lobby activity and counts what it has seen
#[derive(Debug, Default)]
pub struct LoggingBot {
    seen: RwLock<HashMap<LobbyEventKind, u64>>,
}

impl LoggingBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register this bot for every lobby event kind
    pub fn register(self: &Arc<Self>, manager: &mut LobbyManager) {
        for kind in LobbyEventKind::ALL {
            manager.on(kind, self.clone());
        }
    }

    /// Number of events of `kind` handled so far
    pub fn seen(&self, kind: LobbyEventKind) -> u64 {
        self.seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    fn describe(event: &LobbyEvent) -> String {
        match event {
            LobbyEvent::Lobby { channel } => format!("Lobby ready in '{}'", channel),
            LobbyEvent::Join { player, slot, .. } => {
                format!("'{}' joined in slot {}", player, slot)
            }
            LobbyEvent::Leave { player, .. } => format!("'{}' left", player),
            LobbyEvent::Chat {
                player, message, ..
            } => format!("<{}> {}", player, message),
            LobbyEvent::Ready { .. } => "All players are ready".to_string(),
            LobbyEvent::MatchStart { .. } => "Match started".to_string(),
            LobbyEvent::MatchEnd { reason, .. } => format!("Match {}", reason),
            LobbyEvent::HostNew { player, .. } => format!("'{}' is the new host", player),
            LobbyEvent::HostChoosing { .. } => "Host is choosing a beatmap".to_string(),
            LobbyEvent::BeatmapChange { name, id, .. } => {
                format!("Beatmap is now '{}' ({})", name, id)
            }
            LobbyEvent::SystemMessage { text, .. } => format!("System: {}", text),
        }
    }
}

#[async_trait]
impl EventHandler<LobbyEvent> for LoggingBot {
    async fn handle(&self, event: LobbyEvent) -> Result<()> {
        info!(
            channel = event.channel(),
            event = %event.kind(),
            "{}",
            Self::describe(&event)
        );

        *self
            .seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.kind())
            .or_insert(0) += 1;
        Ok(())
    }
}
