//! Protocol engine: connection lifecycle, login and the receive loop
//!
//! The client raises three coarse events through its dispatcher:
//!
//! - `init` once the login handshake was sent and the loop is about to start
//! - `message` for every response-class line
//! - `shutdown` after the loop ended, awaited before the connection closes
//!
//! Keepalive probes are answered inside the loop and never dispatched.

use crate::config::IrcSettings;
use crate::error::{BotError, Result};
use crate::events::{EventDispatcher, EventHandler, FailureSlot};
use crate::irc::command::Command;
use crate::irc::message::{Message, Parsed};
use crate::irc::sender::IrcSender;
use crate::irc::transport::Transport;
use crate::metrics::MetricsCollector;
use crate::types::{ClientEvent, ClientEventKind};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of a client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connected,
    Authenticated,
    Receiving,
    ShuttingDown,
    Closed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Disconnected => "disconnected",
            ClientState::Connected => "connected",
            ClientState::Authenticated => "authenticated",
            ClientState::Receiving => "receiving",
            ClientState::ShuttingDown => "shutting down",
            ClientState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Single-connection protocol client
pub struct IrcClient {
    host: String,
    port: u16,
    state: ClientState,
    transport: Transport,
    dispatcher: EventDispatcher<ClientEvent>,
    identity: Option<String>,
    metrics: MetricsCollector,
}

impl IrcClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            state: ClientState::Disconnected,
            transport: Transport::new(),
            dispatcher: EventDispatcher::new(),
            identity: None,
            metrics: MetricsCollector::default(),
        }
    }

    pub fn from_settings(settings: &IrcSettings) -> Self {
        Self::new(settings.host.clone(), settings.port)
    }

    /// Report into `metrics` instead of a private collector
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Identity sent during login, once logged in
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Handle for sending commands, valid before and after connecting
    pub fn sender(&self) -> IrcSender {
        IrcSender::new(self.transport.writer(), self.metrics.clone())
    }

    /// Slot that ends the receive loop when a failure is recorded into it
    pub fn failures(&self) -> Arc<FailureSlot> {
        self.dispatcher.failures()
    }

    /// Bind `handler` to one of the client events
    pub fn on(
        &mut self,
        kind: ClientEventKind,
        handler: Arc<dyn EventHandler<ClientEvent>>,
    ) -> Option<Arc<dyn EventHandler<ClientEvent>>> {
        self.dispatcher.register(kind, handler)
    }

    fn expect_state(&self, expected: ClientState) -> Result<()> {
        if self.state != expected {
            return Err(BotError::InvalidState {
                expected: expected.to_string(),
                actual: self.state.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Open the connection to the configured server
    pub async fn connect(&mut self) -> Result<()> {
        self.expect_state(ClientState::Disconnected)?;
        self.transport.connect(&self.host, self.port).await?;
        self.state = ClientState::Connected;
        Ok(())
    }

    /// Use an established stream instead of dialing the server
    pub async fn connect_with<S>(&mut self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.expect_state(ClientState::Disconnected)?;
        self.transport.attach(stream).await;
        self.state = ClientState::Connected;
        Ok(())
    }

    /// Send the login handshake: `PASS`, `USER`, `NICK`
    pub async fn login(&mut self, identity: &str, credential: &str) -> Result<()> {
        self.expect_state(ClientState::Connected)?;

        let sender = self.sender();
        sender.send(&Command::Pass(credential.to_string())).await?;
        sender.send(&Command::User(identity.to_string())).await?;
        sender.send(&Command::Nick(identity.to_string())).await?;

        self.identity = Some(identity.to_string());
        self.state = ClientState::Authenticated;
        info!("Logged in as '{}'", identity);
        Ok(())
    }

    /// Run the receive loop until it fails, then shut down
    ///
    /// The loop only ends on a failure; that failure is returned once the
    /// `shutdown` handler finished and the connection was closed.
    pub async fn run(&mut self) -> Result<()> {
        self.expect_state(ClientState::Authenticated)?;
        self.state = ClientState::Receiving;

        if self.dispatcher.dispatch_async(ClientEvent::Init).is_some() {
            self.metrics.record_event_dispatched(ClientEventKind::Init);
        }

        let outcome = self.receive_loop().await;
        if let Err(e) = &outcome {
            warn!("Receive loop ended: {:#}", e);
        }

        self.shutdown().await;
        outcome
    }

    /// Connect, log in and run
    pub async fn start(&mut self, identity: &str, credential: &str) -> Result<()> {
        self.connect().await?;
        if let Err(e) = self.login(identity, credential).await {
            self.transport.close().await;
            self.state = ClientState::Closed;
            return Err(e);
        }
        self.run().await
    }

    async fn receive_loop(&mut self) -> Result<()> {
        let failures = self.dispatcher.failures();
        loop {
            if let Some(failure) = failures.take() {
                if matches!(
                    failure.downcast_ref::<BotError>(),
                    Some(BotError::HandlerFailure { .. })
                ) {
                    self.metrics.record_handler_failure();
                }
                return Err(failure);
            }

            let line = tokio::select! {
                biased;
                _ = failures.wait() => continue,
                line = self.transport.read_line() => line?,
            };

            self.handle_line(&line).await?;
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            trace!("Skipping blank line");
            return Ok(());
        }

        self.metrics.record_line_received();
        debug!("<< {}", line);

        match Message::parse(line)? {
            Parsed::Directive(directive) if directive.name == "PING" => {
                self.sender().send(&Command::Pong(directive.argument)).await?;
                self.metrics.record_keepalive();
            }
            Parsed::Directive(directive) => {
                return Err(BotError::UnsupportedDirective {
                    directive: directive.to_string(),
                }
                .into());
            }
            Parsed::Message(message) => {
                if self
                    .dispatcher
                    .dispatch_async(ClientEvent::Message(message))
                    .is_some()
                {
                    self.metrics.record_event_dispatched(ClientEventKind::Message);
                }
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.state = ClientState::ShuttingDown;
        info!("Shutting down connection to {}:{}", self.host, self.port);

        if let Err(e) = self.dispatcher.dispatch_blocking(ClientEvent::Shutdown).await {
            error!("Shutdown handler failed: {:#}", e);
            self.metrics.record_handler_failure();
        }

        if let Err(e) = self.sender().send(&Command::Quit).await {
            warn!("Failed to send QUIT: {}", e);
        }

        self.transport.close().await;
        self.state = ClientState::Closed;
        info!("Connection closed");
    }
}
