//! Test fixtures for integration testing
//!
//! Provides an in-process scripted server on the other end of a duplex
//! stream and handlers that record the events they receive.

#![allow(dead_code)]

use autohost::events::{handler_fn, Event, EventHandler};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{
    duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf,
    WriteHalf,
};
use tokio::time::{sleep, timeout, Instant};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Server side of a connection used by the client under test
pub struct ScriptedServer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

/// Create a connected pair; hand the stream to the client
pub fn connected_pair() -> (DuplexStream, ScriptedServer) {
    let (client, server) = duplex(64 * 1024);
    let (read_half, writer) = split(server);
    (
        client,
        ScriptedServer {
            lines: BufReader::new(read_half).lines(),
            writer,
        },
    )
}

impl ScriptedServer {
    /// Send one line to the client, terminated by CR LF
    pub async fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .expect("failed to send line to client");
    }

    /// Next line sent by the client
    pub async fn expect_line(&mut self) -> String {
        timeout(TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line from the client")
            .expect("failed to read from client")
            .expect("client closed the connection")
    }

    /// Consume the login handshake and check its order
    pub async fn expect_handshake(&mut self, identity: &str, credential: &str) {
        assert_eq!(self.expect_line().await, format!("PASS {}", credential));
        assert_eq!(self.expect_line().await, format!("USER {}", identity));
        assert_eq!(self.expect_line().await, format!("NICK {}", identity));
    }

    /// Resolves with `true` once the client has closed its side
    pub async fn expect_closed(&mut self) -> bool {
        matches!(timeout(TIMEOUT, self.lines.next_line()).await, Ok(Ok(None)))
    }
}

/// Poll `condition` until it holds, panicking after [`TIMEOUT`]
pub async fn wait_for<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(5)).await;
    }
}

/// Like [`wait_for`] for conditions that need to await
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + TIMEOUT;
    while !condition().await {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(5)).await;
    }
}

/// Handler that stores every event it receives
pub fn recording_handler<E: Event>() -> (Arc<dyn EventHandler<E>>, Arc<Mutex<Vec<E>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let recorded = events.clone();
    let handler = handler_fn(move |event: E| {
        let recorded = recorded.clone();
        async move {
            recorded.lock().unwrap().push(event);
            Ok(())
        }
    });
    (handler, events)
}
