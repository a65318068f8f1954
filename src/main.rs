//! Main entry point for the autohost client
//!
//! Loads configuration, initializes logging and runs one auto host rotate
//! lobby until the connection ends or the process is interrupted.

use anyhow::Result;
use autohost::config::{validate_config, AppConfig};
use autohost::service::AppState;
use autohost::BotError;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

/// Autohost - IRC bot that rotates the host of an osu! multiplayer lobby
#[derive(Parser)]
#[command(
    name = "autohost",
    version,
    about = "IRC bot that runs an auto host rotate osu! multiplayer lobby",
    long_about = "Autohost logs in to the Bancho IRC gateway, creates a multiplayer lobby and \
                 follows the system bot's announcements to hand the host role to each player \
                 in turn as matches finish."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Server host override
    #[arg(long, value_name = "HOST", help = "Override IRC server host")]
    host: Option<String>,

    /// Server port override
    #[arg(long, value_name = "PORT", help = "Override IRC server port")]
    port: Option<u16>,

    /// Lobby title override
    #[arg(long, value_name = "TITLE", help = "Override the lobby title")]
    lobby_name: Option<String>,

    /// Metrics port override
    #[arg(long, value_name = "PORT", help = "Serve health and metrics on this port")]
    metrics_port: Option<u16>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without connecting")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with client information
fn display_startup_banner(config: &AppConfig) {
    info!("Autohost {}", autohost::VERSION);
    info!("   Server: {}:{}", config.irc.host, config.irc.port);
    info!("   Username: {}", config.irc.username);
    info!("   Lobby: {}", config.lobby.title);
    info!("   System bot: {}", config.lobby.system_bot);
    info!("   Log level: {}", config.service.log_level);
    match config.service.metrics_port {
        Some(port) => info!("   Metrics port: {}", port),
        None => info!("   Metrics: disabled"),
    }
}

/// Load configuration from file or environment and apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(config_path) => AppConfig::from_file(config_path)?,
        None => AppConfig::from_env()?,
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(host) = &args.host {
        config.irc.host = host.clone();
    }

    if let Some(port) = args.port {
        config.irc.port = port;
    }

    if let Some(lobby_name) = &args.lobby_name {
        config.lobby.title = lobby_name.clone();
    }

    if let Some(metrics_port) = args.metrics_port {
        config.service.metrics_port = Some(metrics_port);
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without connecting");
        return Ok(());
    }

    let mut app_state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize client: {:#}", e);
            std::process::exit(1);
        }
    };

    match app_state.run().await {
        Ok(()) => Ok(()),
        Err(e) => match BotError::root_of(&e) {
            Some(BotError::Interrupted { signal }) => {
                info!("Stopped after {}", signal);
                Ok(())
            }
            _ => {
                error!("Autohost stopped: {:#}", e);
                std::process::exit(1);
            }
        },
    }
}
