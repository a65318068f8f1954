//! Line-framed connection to the server
//!
//! The read half is owned by the receive loop. The write half lives behind a
//! cloneable [`LineWriter`] so event handlers can send while the loop is
//! parked waiting for input.

use crate::error::{BotError, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Longest accepted line, terminator included
pub const MAX_LINE_LENGTH: usize = 8192;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared handle on the write half of the connection
#[derive(Clone, Default)]
pub struct LineWriter {
    inner: Arc<Mutex<Option<BoxedWriter>>>,
}

impl LineWriter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn install(&self, writer: BoxedWriter) {
        *self.inner.lock().await = Some(writer);
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Send one line followed by CR LF and flush it
    ///
    /// Each line goes out in a single write under the lock, so lines sent
    /// from concurrent handlers never interleave.
    pub async fn write_line(&self, line: &str) -> Result<()> {
        if line.contains(['\r', '\n']) {
            return Err(BotError::InvalidOutbound {
                line: line.to_string(),
            }
            .into());
        }

        let mut guard = self.inner.lock().await;
        let writer = guard.as_mut().ok_or(BotError::NotConnected)?;

        let mut framed = Vec::with_capacity(line.len() + 2);
        framed.extend_from_slice(line.as_bytes());
        framed.extend_from_slice(b"\r\n");
        writer.write_all(&framed).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Shut the write half down; later calls are no-ops
    pub async fn shutdown(&self) {
        let writer = self.inner.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                debug!("Ignoring error while closing writer: {}", e);
            }
        }
    }
}

/// Owns the connection and frames it into lines
#[derive(Default)]
pub struct Transport {
    reader: Option<BufReader<BoxedReader>>,
    writer: LineWriter,
    pending: Vec<u8>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a TCP connection to `host:port`
    pub async fn open(host: &str, port: u16) -> Result<Self> {
        let mut transport = Self::new();
        transport.connect(host, port).await?;
        Ok(transport)
    }

    /// Connect this transport to `host:port`, keeping existing writer handles valid
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let address = format!("{}:{}", host, port);
        info!("Connecting to {}", address);

        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| BotError::ConnectionError {
                address: address.clone(),
                message: e.to_string(),
            })?;
        stream.set_nodelay(true)?;

        self.attach(stream).await;
        info!("Connected to {}", address);
        Ok(())
    }

    /// Use an already established stream as the connection
    pub async fn attach<S>(&mut self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        self.reader = Some(BufReader::new(Box::new(read_half)));
        self.pending.clear();
        self.writer.install(Box::new(write_half)).await;
    }

    pub fn is_attached(&self) -> bool {
        self.reader.is_some()
    }

    /// Cloneable handle on the write half
    pub fn writer(&self) -> LineWriter {
        self.writer.clone()
    }

    /// Read the next line with its CR LF terminator removed
    ///
    /// Partially received bytes are kept across cancellation, so this can
    /// sit inside `select!`. A line longer than [`MAX_LINE_LENGTH`] is a
    /// [`BotError::Parse`] failure.
    pub async fn read_line(&mut self) -> Result<String> {
        let reader = self.reader.as_mut().ok_or(BotError::NotConnected)?;

        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                // EOF; anything without a terminator is dropped
                if !self.pending.is_empty() {
                    warn!("Discarding {} bytes of unterminated input", self.pending.len());
                    self.pending.clear();
                }
                return Err(BotError::ConnectionClosed.into());
            }

            let (used, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(idx) => (idx + 1, true),
                None => (available.len(), false),
            };
            self.pending.extend_from_slice(&available[..used]);
            reader.consume(used);

            if self.pending.len() > MAX_LINE_LENGTH {
                let head = String::from_utf8_lossy(&self.pending[..64]).into_owned();
                self.pending.clear();
                return Err(BotError::Parse {
                    line: head,
                    reason: format!("line exceeds {} bytes", MAX_LINE_LENGTH),
                }
                .into());
            }
            if complete {
                break;
            }
        }

        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn write_line(&self, line: &str) -> Result<()> {
        self.writer.write_line(line).await
    }

    /// Best-effort close of both halves; safe to call more than once
    pub async fn close(&mut self) {
        self.writer.shutdown().await;
        if self.reader.take().is_some() {
            debug!("Transport closed");
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    async fn attached_pair() -> (Transport, tokio::io::DuplexStream) {
        let (client, server) = duplex(1024);
        let mut transport = Transport::new();
        transport.attach(client).await;
        (transport, server)
    }

    #[tokio::test]
    async fn test_read_line_strips_terminators() {
        let (mut transport, mut server) = attached_pair().await;
        server
            .write_all(b"PING one\r\nPING two\n:a B c\r\n")
            .await
            .unwrap();

        assert_eq!(transport.read_line().await.unwrap(), "PING one");
        assert_eq!(transport.read_line().await.unwrap(), "PING two");
        assert_eq!(transport.read_line().await.unwrap(), ":a B c");
    }

    #[tokio::test]
    async fn test_overlong_line_is_parse_error() {
        let (client, mut server) = duplex(4 * MAX_LINE_LENGTH);
        let mut transport = Transport::new();
        transport.attach(client).await;

        server
            .write_all(&vec![b'a'; MAX_LINE_LENGTH + 1])
            .await
            .unwrap();

        let err = transport.read_line().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let (client, mut server) = duplex(4 * MAX_LINE_LENGTH);
        let mut transport = Transport::new();
        transport.attach(client).await;

        let mut line = vec![b'a'; MAX_LINE_LENGTH - 2];
        line.extend_from_slice(b"\r\n");
        server.write_all(&line).await.unwrap();

        assert_eq!(transport.read_line().await.unwrap().len(), MAX_LINE_LENGTH - 2);
    }

    #[tokio::test]
    async fn test_read_line_reports_closed_connection() {
        let (mut transport, server) = attached_pair().await;
        drop(server);

        let err = transport.read_line().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_write_line_appends_crlf() {
        let (transport, mut server) = attached_pair().await;
        transport.write_line("NICK autobot").await.unwrap();

        let mut buf = [0u8; 14];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"NICK autobot\r\n");
    }

    #[tokio::test]
    async fn test_write_line_rejects_embedded_newline() {
        let (transport, _server) = attached_pair().await;
        let err = transport
            .write_line("PRIVMSG #mp_1 :hi\r\nQUIT")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::InvalidOutbound { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_refused_is_connection_error() {
        // Bind then drop a listener to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = match Transport::open("127.0.0.1", port).await {
            Ok(_) => panic!("connect should fail"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::ConnectionError { .. })
        ));
    }

    #[tokio::test]
    async fn test_writer_handle_survives_attach() {
        let mut transport = Transport::new();
        let writer = transport.writer();
        assert!(!writer.is_open().await);

        let (client, mut server) = duplex(64);
        transport.attach(client).await;
        writer.write_line("QUIT").await.unwrap();

        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"QUIT\r\n");
    }

    #[tokio::test]
    async fn test_operations_without_connection() {
        let mut transport = Transport::new();
        assert!(!transport.is_attached());

        let err = transport.write_line("QUIT").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::NotConnected)
        ));
        let err = transport.read_line().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut transport, _server) = attached_pair().await;
        let writer = transport.writer();

        transport.close().await;
        transport.close().await;

        assert!(!writer.is_open().await);
        assert!(writer.write_line("QUIT").await.is_err());
    }
}
