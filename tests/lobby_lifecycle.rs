//! Lobby integration tests
//!
//! A real client and lobby manager talk to a scripted server playing the
//! role of the system bot.

mod fixtures;

use autohost::bot::LoggingBot;
use autohost::config::LobbySettings;
use autohost::irc::{ChatSender, ClientState, IrcClient};
use autohost::{BotError, LobbyEventKind, LobbyManager};
use std::sync::Arc;
use tokio::task::JoinHandle;

use fixtures::{connected_pair, wait_for, wait_until, ScriptedServer};

const CHANNEL: &str = "#mp_1";

struct Harness {
    server: ScriptedServer,
    manager: Arc<LobbyManager>,
    logging_bot: Arc<LoggingBot>,
    run: JoinHandle<(IrcClient, anyhow::Result<()>)>,
}

async fn start_lobby_bot() -> Harness {
    let mut client = IrcClient::new("irc.example.org", 6667);
    let sender: Arc<dyn ChatSender> = Arc::new(client.sender());
    let settings = LobbySettings {
        title: "Test lobby".to_string(),
        ..LobbySettings::default()
    };

    let mut manager = LobbyManager::new(settings, "autobot", sender);
    let logging_bot = Arc::new(LoggingBot::new());
    logging_bot.register(&mut manager);
    let manager = Arc::new(manager);
    manager.register_with(&mut client);

    let (stream, mut server) = connected_pair();
    client.connect_with(stream).await.unwrap();
    client.login("autobot", "secret").await.unwrap();
    server.expect_handshake("autobot", "secret").await;

    let run = tokio::spawn(async move {
        let result = client.run().await;
        (client, result)
    });

    Harness {
        server,
        manager,
        logging_bot,
        run,
    }
}

async fn open_lobby(harness: &mut Harness) {
    assert_eq!(
        harness.server.expect_line().await,
        "PRIVMSG BanchoBot :!mp make Test lobby"
    );
    harness
        .server
        .send_line(&format!(":autobot!cho@ppy.sh JOIN :{}", CHANNEL))
        .await;
    assert_eq!(
        harness.server.expect_line().await,
        format!("PRIVMSG {} :!mp password", CHANNEL)
    );
}

fn announce(text: &str) -> String {
    format!(":BanchoBot!cho@ppy.sh PRIVMSG {} :{}", CHANNEL, text)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_host_rotation_flow() {
    let mut harness = start_lobby_bot().await;
    open_lobby(&mut harness).await;

    harness
        .server
        .send_line(&announce("Alice joined in slot 1."))
        .await;
    assert_eq!(
        harness.server.expect_line().await,
        format!("PRIVMSG {} :!mp host Alice", CHANNEL)
    );

    harness
        .server
        .send_line(&announce("Bob joined in slot 2."))
        .await;
    let manager = harness.manager.clone();
    wait_until(|| {
        let manager = manager.clone();
        async move { manager.host_queue().await.len() == 2 }
    })
    .await;
    assert_eq!(manager.host_queue().await, vec!["Bob", "Alice"]);

    harness
        .server
        .send_line(&announce("The match has started!"))
        .await;
    wait_until(|| {
        let manager = manager.clone();
        async move { manager.snapshot().await.match_in_progress }
    })
    .await;
    harness
        .server
        .send_line(&announce("The match has finished!"))
        .await;
    assert_eq!(
        harness.server.expect_line().await,
        format!("PRIVMSG {} :!mp host Alice", CHANNEL)
    );
    assert_eq!(manager.host_queue().await, vec!["Alice", "Bob"]);

    harness.server.send_line("ERROR :Closing link").await;
    assert_eq!(
        harness.server.expect_line().await,
        format!("PRIVMSG {} :!mp close", CHANNEL)
    );
    assert_eq!(harness.server.expect_line().await, "QUIT");

    let (client, result) = harness.run.await.unwrap();
    assert!(matches!(
        BotError::root_of(&result.unwrap_err()),
        Some(BotError::UnsupportedDirective { .. })
    ));
    assert_eq!(client.state(), ClientState::Closed);
    assert!(!manager.is_open().await);

    let stats = manager.stats();
    assert_eq!(stats.lobbies_opened, 1);
    assert_eq!(stats.players_joined, 2);
    assert_eq!(stats.matches_played, 1);
    assert_eq!(stats.host_rotations, 1);

    // Lobby events are raised after the outbound command they follow
    let bot = harness.logging_bot.clone();
    wait_for(|| bot.seen(LobbyEventKind::MatchEnd) == 1).await;
    assert_eq!(bot.seen(LobbyEventKind::Lobby), 1);
    assert_eq!(bot.seen(LobbyEventKind::Join), 2);
    assert_eq!(bot.seen(LobbyEventKind::MatchStart), 1);
}

#[tokio::test]
async fn test_player_command_is_relayed() {
    let mut harness = start_lobby_bot().await;
    open_lobby(&mut harness).await;

    harness
        .server
        .send_line(&format!(":alice!cho@ppy.sh PRIVMSG {} :!mp start 5", CHANNEL))
        .await;
    assert_eq!(
        harness.server.expect_line().await,
        format!("PRIVMSG {} :!mp start 5", CHANNEL)
    );

    drop(harness.server);
    let (_, result) = harness.run.await.unwrap();
    assert!(result.is_err());
    assert_eq!(harness.manager.stats().commands_relayed, 1);
    let bot = harness.logging_bot.clone();
    wait_for(|| bot.seen(LobbyEventKind::Chat) == 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_leave_ends_the_session() {
    let mut harness = start_lobby_bot().await;
    open_lobby(&mut harness).await;

    harness
        .server
        .send_line(&announce("Mallory left the game."))
        .await;

    // The lobby is still closed on the way out
    assert_eq!(
        harness.server.expect_line().await,
        format!("PRIVMSG {} :!mp close", CHANNEL)
    );
    assert_eq!(harness.server.expect_line().await, "QUIT");

    let (client, result) = harness.run.await.unwrap();
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BotError>(),
        Some(BotError::HandlerFailure { event }) if event == "message"
    ));
    assert!(matches!(
        BotError::root_of(&err),
        Some(BotError::QueueConsistency { .. })
    ));
    assert_eq!(client.state(), ClientState::Closed);
}

#[tokio::test]
async fn test_prefix_lookalike_is_not_relayed() {
    let mut harness = start_lobby_bot().await;
    open_lobby(&mut harness).await;

    harness
        .server
        .send_line(&format!(":alice!cho@ppy.sh PRIVMSG {} :!mpfoo", CHANNEL))
        .await;
    harness
        .server
        .send_line(&format!(":alice!cho@ppy.sh PRIVMSG {} :!mp abort", CHANNEL))
        .await;

    // Only the real lobby command comes back out
    assert_eq!(
        harness.server.expect_line().await,
        format!("PRIVMSG {} :!mp abort", CHANNEL)
    );
    let bot = harness.logging_bot.clone();
    wait_for(|| bot.seen(LobbyEventKind::Chat) == 2).await;
    assert_eq!(harness.manager.stats().commands_relayed, 1);
}
