//! Sending commands and chat through the shared write half

use crate::error::Result;
use crate::irc::command::Command;
use crate::irc::transport::LineWriter;
use crate::metrics::MetricsCollector;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

/// Trait for anything that can deliver chat text to a target
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send `text` to a channel or user
    async fn privmsg(&self, target: &str, text: &str) -> Result<()>;
}

/// Sender backed by the live connection
#[derive(Clone)]
pub struct IrcSender {
    writer: LineWriter,
    metrics: MetricsCollector,
}

impl IrcSender {
    pub fn new(writer: LineWriter, metrics: MetricsCollector) -> Self {
        Self { writer, metrics }
    }

    /// Write one command to the connection
    pub async fn send(&self, command: &Command) -> Result<()> {
        debug!(">> {}", command);
        self.writer.write_line(&command.to_wire()).await?;
        self.metrics.record_outbound(command.name());
        Ok(())
    }
}

#[async_trait]
impl ChatSender for IrcSender {
    async fn privmsg(&self, target: &str, text: &str) -> Result<()> {
        self.send(&Command::Privmsg {
            target: target.to_string(),
            text: text.to_string(),
        })
        .await
    }
}

/// Sender that records every message instead of sending it (for testing)
#[derive(Default)]
pub struct RecordingChatSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChatSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far as `(target, text)` pairs
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Texts sent so far, targets dropped
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl ChatSender for RecordingChatSender {
    async fn privmsg(&self, target: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((target.to_string(), text.to_string()));
        Ok(())
    }
}
