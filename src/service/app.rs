//! Main application state and service coordination
//!
//! This module wires the protocol client, the lobby manager, the logging bot
//! and the optional health server together and runs them until the
//! connection ends.

use crate::bot::LoggingBot;
use crate::config::{require_credentials, AppConfig};
use crate::error::{BotError, Result};
use crate::irc::{ChatSender, IrcClient};
use crate::lobby::LobbyManager;
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector};
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything needed to run one lobby
pub struct AppState {
    config: AppConfig,
    client: IrcClient,
    lobby_manager: Arc<LobbyManager>,
    logging_bot: Arc<LoggingBot>,
    metrics_collector: MetricsCollector,
    health_server: Option<Arc<HealthServer>>,
    background_tasks: Vec<JoinHandle<()>>,
}

impl AppState {
    /// Build all components from the configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing autohost client");
        require_credentials(&config)?;

        let metrics_collector = MetricsCollector::new()?;

        let mut client =
            IrcClient::from_settings(&config.irc).with_metrics(metrics_collector.clone());
        let sender: Arc<dyn ChatSender> = Arc::new(client.sender());

        let mut lobby_manager = LobbyManager::with_metrics(
            config.lobby.clone(),
            config.irc.username.clone(),
            sender,
            metrics_collector.clone(),
        );

        let logging_bot = Arc::new(LoggingBot::new());
        logging_bot.register(&mut lobby_manager);

        let lobby_manager = Arc::new(lobby_manager);
        lobby_manager.register_with(&mut client);

        let health_server = config.service.metrics_port.map(|port| {
            let health_config = HealthServerConfig {
                port,
                ..HealthServerConfig::default()
            };
            Arc::new(
                HealthServer::new(health_config, metrics_collector.clone())
                    .with_lobby_manager(lobby_manager.clone()),
            )
        });

        Ok(Self {
            config,
            client,
            lobby_manager,
            logging_bot,
            metrics_collector,
            health_server,
            background_tasks: Vec::new(),
        })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get lobby manager
    pub fn lobby_manager(&self) -> Arc<LobbyManager> {
        self.lobby_manager.clone()
    }

    pub fn logging_bot(&self) -> Arc<LoggingBot> {
        self.logging_bot.clone()
    }

    pub fn metrics_collector(&self) -> &MetricsCollector {
        &self.metrics_collector
    }

    /// Connect, run the lobby until the connection ends, then stop background tasks
    ///
    /// An interrupt signal ends the run with [`BotError::Interrupted`] after the
    /// lobby was closed.
    pub async fn run(&mut self) -> Result<()> {
        self.start_health_server();
        self.start_signal_listener();

        info!(
            "Connecting to {}:{} as '{}'",
            self.config.irc.host, self.config.irc.port, self.config.irc.username
        );
        let username = self.config.irc.username.clone();
        let password = self.config.irc.password.clone();
        let result = self.client.start(&username, &password).await;

        self.shutdown();
        info!("Final lobby statistics: {:?}", self.lobby_manager.stats());
        result
    }

    fn start_health_server(&mut self) {
        let Some(health_server) = self.health_server.clone() else {
            debug!("No metrics port configured, health server disabled");
            return;
        };

        self.background_tasks.push(tokio::spawn(async move {
            if let Err(e) = health_server.start().await {
                error!("Health server failed: {}", e);
            }
        }));
    }

    fn start_signal_listener(&mut self) {
        let failures = self.client.failures();
        self.background_tasks.push(tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(signal) => {
                    info!("Received {}, closing the lobby", signal);
                    failures.record(
                        BotError::Interrupted {
                            signal: signal.to_string(),
                        }
                        .into(),
                    );
                }
                Err(e) => warn!("Failed to listen for shutdown signals: {}", e),
            }
        }));
    }

    fn shutdown(&mut self) {
        if let Some(health_server) = &self.health_server {
            health_server.stop();
        }

        let task_count = self.background_tasks.len();
        for task in self.background_tasks.drain(..) {
            task.abort();
        }
        debug!("Stopped {} background tasks", task_count);
    }
}

/// Wait for SIGINT or SIGTERM and return the name of the one received
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

/// Wait for Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    signal::ctrl_c().await?;
    Ok("SIGINT")
}
