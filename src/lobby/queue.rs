//! Host rotation queue
//!
//! The head of the queue is the player who receives the host role when the
//! current match ends. Rotation moves the head to the back.

use crate::error::BotError;
use crate::types::PlayerName;
use std::collections::VecDeque;
use tracing::warn;

/// What happened to a player added through [`HostQueue::join`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The queue was empty; the player should be made host right away
    Promoted,
    /// The player was placed ahead of the only other member
    QueuedFront,
    QueuedBack,
    /// The player was already queued; nothing changed
    AlreadyQueued,
}

/// Ordered, duplicate-free sequence of players
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostQueue {
    players: VecDeque<PlayerName>,
}

impl HostQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly joined player
    ///
    /// With exactly one member queued, that member is the current host and
    /// the newcomer goes ahead of them so the host role passes on first.
    pub fn join(&mut self, player: &str) -> JoinOutcome {
        if self.contains(player) {
            warn!("Player '{}' is already in the host queue", player);
            return JoinOutcome::AlreadyQueued;
        }

        match self.players.len() {
            0 => {
                self.players.push_back(player.to_string());
                JoinOutcome::Promoted
            }
            1 => {
                self.players.push_front(player.to_string());
                JoinOutcome::QueuedFront
            }
            _ => {
                self.players.push_back(player.to_string());
                JoinOutcome::QueuedBack
            }
        }
    }

    /// Remove a departing player, returning the position they held
    pub fn leave(&mut self, player: &str) -> Result<usize, BotError> {
        let position = self
            .players
            .iter()
            .position(|queued| queued == player)
            .ok_or_else(|| BotError::QueueConsistency {
                reason: format!("player '{}' left but was not in the host queue", player),
            })?;
        self.players.remove(position);
        Ok(position)
    }

    /// Move the head to the back and return the new head
    pub fn rotate(&mut self) -> Option<&str> {
        if let Some(head) = self.players.pop_front() {
            self.players.push_back(head);
        }
        self.head()
    }

    pub fn head(&self) -> Option<&str> {
        self.players.front().map(String::as_str)
    }

    pub fn contains(&self, player: &str) -> bool {
        self.players.iter().any(|queued| queued == player)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Queued players, head first
    pub fn players(&self) -> Vec<PlayerName> {
        self.players.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
