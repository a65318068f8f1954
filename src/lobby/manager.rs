//! Lobby manager driving a single auto host rotate lobby
//!
//! The manager listens to the client's `init`, `message` and `shutdown`
//! events. It recognizes system bot announcements in the lobby channel,
//! keeps the host queue up to date, issues lobby commands and raises finer
//! lobby events to its own handlers.

use crate::config::LobbySettings;
use crate::error::Result;
use crate::events::{Event, EventDispatcher, EventHandler};
use crate::irc::client::IrcClient;
use crate::irc::message::Message;
use crate::irc::sender::ChatSender;
use crate::lobby::patterns::{classify, Announcement};
use crate::lobby::queue::JoinOutcome;
use crate::lobby::session::{Beatmap, LobbySession, LobbySnapshot};
use crate::metrics::MetricsCollector;
use crate::types::{ClientEvent, ClientEventKind, LobbyEvent, LobbyEventKind, PlayerName};
use crate::utils::strip_identity_suffix;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Statistics about lobby manager operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LobbyManagerStats {
    /// Total number of lobbies opened
    pub lobbies_opened: u64,
    /// Total number of players that joined
    pub players_joined: u64,
    /// Total number of players that left
    pub players_left: u64,
    /// Total number of matches that ended, finished or aborted
    pub matches_played: u64,
    /// Total number of host rotations issued
    pub host_rotations: u64,
    /// Total number of player commands relayed to the lobby
    pub commands_relayed: u64,
}

/// The lobby manager
pub struct LobbyManager {
    settings: LobbySettings,
    /// Nickname the bot logged in with
    identity: String,
    sender: Arc<dyn ChatSender>,
    /// Held for the whole handling of one message
    session: Mutex<LobbySession>,
    dispatcher: EventDispatcher<LobbyEvent>,
    stats: RwLock<LobbyManagerStats>,
    metrics: MetricsCollector,
}

impl LobbyManager {
    /// Create a new lobby manager
    pub fn new(
        settings: LobbySettings,
        identity: impl Into<String>,
        sender: Arc<dyn ChatSender>,
    ) -> Self {
        Self::with_metrics(settings, identity, sender, MetricsCollector::default())
    }

    /// Create a new lobby manager with metrics collector
    pub fn with_metrics(
        settings: LobbySettings,
        identity: impl Into<String>,
        sender: Arc<dyn ChatSender>,
        metrics: MetricsCollector,
    ) -> Self {
        let session = LobbySession::new(settings.title.clone());
        Self {
            settings,
            identity: identity.into(),
            sender,
            session: Mutex::new(session),
            dispatcher: EventDispatcher::new(),
            stats: RwLock::new(LobbyManagerStats::default()),
            metrics,
        }
    }

    pub fn settings(&self) -> &LobbySettings {
        &self.settings
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Bind `handler` to one of the lobby events
    pub fn on(
        &mut self,
        kind: LobbyEventKind,
        handler: Arc<dyn EventHandler<LobbyEvent>>,
    ) -> Option<Arc<dyn EventHandler<LobbyEvent>>> {
        self.dispatcher.register(kind, handler)
    }

    /// Register this manager for the client's `init`, `message` and `shutdown` events
    pub fn register_with(self: &Arc<Self>, client: &mut IrcClient) {
        let handler: Arc<dyn EventHandler<ClientEvent>> = self.clone();
        client.on(ClientEventKind::Init, handler.clone());
        client.on(ClientEventKind::Message, handler.clone());
        client.on(ClientEventKind::Shutdown, handler);
    }

    /// Ask the system bot to create the lobby
    pub async fn create_lobby(&self) -> Result<()> {
        info!(
            "Requesting lobby '{}' from '{}'",
            self.settings.title, self.settings.system_bot
        );
        self.sender
            .privmsg(
                &self.settings.system_bot,
                &format!("!mp make {}", self.settings.title),
            )
            .await
    }

    /// Close the open lobby, if any, and forget its state
    pub async fn close_lobby(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        let Some(channel) = session.close() else {
            debug!("No lobby open, nothing to close");
            return Ok(());
        };
        self.metrics.set_host_queue_length(0);

        info!("Closing lobby '{}'", channel);
        self.sender.privmsg(&channel, "!mp close").await
    }

    /// Process one received message and raise the resulting lobby events
    pub async fn handle_message(&self, message: &Message) -> Result<()> {
        let events = {
            let mut session = self.session.lock().await;
            let events = self.process(&mut session, message).await?;
            self.metrics.set_host_queue_length(session.queue.len());
            events
        };

        for event in events {
            if self.dispatcher.is_registered(event.kind()) {
                self.metrics.record_event_dispatched(event.kind());
            }
            self.dispatcher.dispatch_blocking(event).await?;
        }
        Ok(())
    }

    async fn process(
        &self,
        session: &mut LobbySession,
        message: &Message,
    ) -> Result<Vec<LobbyEvent>> {
        match message.command.as_str() {
            "JOIN" => self.process_join(session, message).await,
            "PRIVMSG" => self.process_privmsg(session, message).await,
            other => {
                trace!("Ignoring '{}' from '{}'", other, message.sender);
                Ok(Vec::new())
            }
        }
    }

    /// Our own JOIN confirmation tells us which channel the lobby lives in
    async fn process_join(
        &self,
        session: &mut LobbySession,
        message: &Message,
    ) -> Result<Vec<LobbyEvent>> {
        let own_sender = format!("{}{}", self.identity, self.settings.identity_suffix);
        if message.sender != own_sender {
            trace!("Ignoring JOIN from '{}'", message.sender);
            return Ok(Vec::new());
        }

        let channel = if message.trailing.is_empty() {
            message.target().unwrap_or_default().to_string()
        } else {
            message.trailing.clone()
        };
        if channel.is_empty() {
            warn!("JOIN confirmation without a channel: {}", message);
            return Ok(Vec::new());
        }

        session.open(channel.clone());
        self.update_stats(|stats| stats.lobbies_opened += 1);
        info!("Lobby '{}' opened in '{}'", session.title, channel);

        if self.settings.clear_password {
            self.sender.privmsg(&channel, "!mp password").await?;
        }

        Ok(vec![LobbyEvent::Lobby { channel }])
    }

    async fn process_privmsg(
        &self,
        session: &mut LobbySession,
        message: &Message,
    ) -> Result<Vec<LobbyEvent>> {
        let Some(target) = message.target() else {
            debug!("PRIVMSG without a target: {}", message);
            return Ok(Vec::new());
        };

        if !session.is_lobby_channel(target) && target != self.identity {
            trace!("Ignoring PRIVMSG to '{}'", target);
            return Ok(Vec::new());
        }

        let player = strip_identity_suffix(&message.sender, &self.settings.identity_suffix);
        if player != self.settings.system_bot {
            self.relay_command(session, player, &message.trailing).await?;
            return Ok(vec![LobbyEvent::Chat {
                channel: target.to_string(),
                player: player.to_string(),
                message: message.trailing.clone(),
            }]);
        }

        if !session.is_lobby_channel(target) {
            debug!("Ignoring direct message from system bot: {}", message.trailing);
            return Ok(Vec::new());
        }

        let channel = target.to_string();
        let Some(announcement) = classify(&message.trailing) else {
            info!(
                "Unrecognized system message in '{}': {}",
                channel, message.trailing
            );
            return Ok(vec![LobbyEvent::SystemMessage {
                channel,
                text: message.trailing.clone(),
            }]);
        };

        self.metrics.record_announcement(announcement.label());
        self.apply(session, channel, announcement).await
    }

    /// Relay a lobby command typed by a player to the lobby channel
    async fn relay_command(&self, session: &LobbySession, player: &str, text: &str) -> Result<()> {
        if !self.is_lobby_command(text) || player == self.identity {
            return Ok(());
        }
        let Some(channel) = session.channel.as_deref() else {
            debug!("No lobby open, not relaying '{}' from '{}'", text, player);
            return Ok(());
        };

        info!("Relaying '{}' from '{}'", text, player);
        self.sender.privmsg(channel, text).await?;
        self.metrics.record_relayed_command();
        self.update_stats(|stats| stats.commands_relayed += 1);
        Ok(())
    }

    /// The prefix must stand alone as the first word: `!mp start` but not `!mpfoo`
    fn is_lobby_command(&self, text: &str) -> bool {
        text.strip_prefix(&self.settings.command_prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    }

    async fn apply(
        &self,
        session: &mut LobbySession,
        channel: String,
        announcement: Announcement,
    ) -> Result<Vec<LobbyEvent>> {
        let event = match announcement {
            Announcement::PlayerJoined { player, slot } => {
                let outcome = session.queue.join(&player);
                info!("Player '{}' joined in slot {} ({:?})", player, slot, outcome);
                if outcome == JoinOutcome::Promoted {
                    self.assign_host(&channel, &player).await?;
                }
                if outcome != JoinOutcome::AlreadyQueued {
                    self.update_stats(|stats| stats.players_joined += 1);
                }
                LobbyEvent::Join {
                    channel,
                    player,
                    slot,
                }
            }
            Announcement::PlayerLeft { player } => {
                let position = session.queue.leave(&player)?;
                info!("Player '{}' left (was #{} in queue)", player, position + 1);
                self.update_stats(|stats| stats.players_left += 1);
                LobbyEvent::Leave { channel, player }
            }
            Announcement::HostChanged { player } => {
                debug!("'{}' is now the host", player);
                LobbyEvent::HostNew { channel, player }
            }
            Announcement::BeatmapChanged { name, id } => {
                debug!("Beatmap changed to '{}' ({})", name, id);
                session.beatmap = Some(Beatmap {
                    name: name.clone(),
                    id: id.clone(),
                });
                LobbyEvent::BeatmapChange { channel, name, id }
            }
            Announcement::MatchStarted => {
                session.match_in_progress = true;
                LobbyEvent::MatchStart { channel }
            }
            Announcement::AllPlayersReady => LobbyEvent::Ready { channel },
            Announcement::MatchEnded(reason) => {
                session.match_in_progress = false;
                self.update_stats(|stats| stats.matches_played += 1);
                info!("Match {} in '{}'", reason, channel);

                match session.queue.rotate().map(str::to_string) {
                    Some(next) => {
                        self.assign_host(&channel, &next).await?;
                        self.metrics.record_host_rotation();
                        self.update_stats(|stats| stats.host_rotations += 1);
                    }
                    None => debug!("Host queue is empty, nothing to rotate"),
                }
                LobbyEvent::MatchEnd { channel, reason }
            }
            Announcement::HostChoosing => LobbyEvent::HostChoosing { channel },
        };
        Ok(vec![event])
    }

    async fn assign_host(&self, channel: &str, player: &str) -> Result<()> {
        info!("Giving host to '{}'", player);
        self.sender
            .privmsg(channel, &format!("!mp host {}", player))
            .await?;
        self.metrics.record_host_assignment();
        Ok(())
    }

    fn update_stats(&self, update: impl FnOnce(&mut LobbyManagerStats)) {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }

    /// Get current manager statistics
    pub fn stats(&self) -> LobbyManagerStats {
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn snapshot(&self) -> LobbySnapshot {
        self.session.lock().await.snapshot()
    }

    /// Queued players, head first
    pub async fn host_queue(&self) -> Vec<PlayerName> {
        self.session.lock().await.queue.players()
    }

    pub async fn channel(&self) -> Option<String> {
        self.session.lock().await.channel.clone()
    }

    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_open()
    }
}

#[async_trait]
impl EventHandler<ClientEvent> for LobbyManager {
    async fn handle(&self, event: ClientEvent) -> Result<()> {
        match event {
            ClientEvent::Init => self.create_lobby().await,
            ClientEvent::Message(message) => self.handle_message(&message).await,
            ClientEvent::Shutdown => self.close_lobby().await,
        }
    }
}
