//! Line transport over a local stream socket.
//!
//! Lines go out terminated with CR LF and come back with their terminator
//! stripped. Every receive is bounded by a caller-supplied timeout, and a
//! timeout is reported separately from a broken connection.

use crate::core::error::ScanError;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::{debug, trace};

/// Line terminator mandated by the protocol for outgoing lines.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Longest line accepted from the daemon, terminator included.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Why a send or receive did not complete.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No complete line arrived within the bound.
    #[error("no line received within {0:?}")]
    Timeout(Duration),

    /// The peer sent more than [`MAX_LINE_LENGTH`] bytes without a newline.
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    /// The peer closed the connection, or it was already closed locally.
    #[error("connection closed")]
    Closed,

    /// The socket reported an error.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// A connected, line-oriented request/response channel.
#[async_trait]
pub trait LineTransport: Send {
    /// Sends one line; the terminator is appended here.
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Receives one line with its terminator stripped.
    async fn receive_line(&mut self, timeout: Duration) -> Result<String, TransportError>;

    /// Closes the connection. Safe to call more than once, and after a failure.
    async fn close(&mut self);
}

/// [`LineTransport`] over a Unix domain socket.
#[derive(Debug)]
pub struct UnixLineTransport {
    stream: Option<BufReader<UnixStream>>,
    address: String,
}

impl UnixLineTransport {
    /// Connects to the daemon socket. A single attempt is made.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ConnectionFailed` if the socket is absent,
    /// refuses the connection, is not accessible, or does not accept within
    /// `timeout`.
    pub async fn connect(path: &Path, timeout: Duration) -> Result<Self, ScanError> {
        let address = path.display().to_string();
        debug!(socket = %address, "Connecting to scan daemon");

        let stream = match tokio::time::timeout(timeout, UnixStream::connect(path)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ScanError::connection_failed(address, e.to_string())),
            Err(_) => {
                return Err(ScanError::connection_failed(
                    address,
                    format!("connect timed out after {:?}", timeout),
                ))
            }
        };

        Ok(Self {
            stream: Some(BufReader::new(stream)),
            address,
        })
    }

    /// Returns `true` until [`LineTransport::close`] has been called.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

#[async_trait]
impl LineTransport for UnixLineTransport {
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?.get_mut();

        let mut wire = String::with_capacity(line.len() + LINE_TERMINATOR.len());
        wire.push_str(line);
        wire.push_str(LINE_TERMINATOR);

        stream.write_all(wire.as_bytes()).await?;
        stream.flush().await?;
        trace!(line = %line, "Sent line");
        Ok(())
    }

    async fn receive_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;

        let mut buf = String::new();
        let mut limited = stream.take(MAX_LINE_LENGTH as u64);
        match tokio::time::timeout(timeout, limited.read_line(&mut buf)).await {
            Err(_) => Err(TransportError::Timeout(timeout)),
            Ok(Err(e)) => Err(TransportError::Io(e)),
            Ok(Ok(0)) => Err(TransportError::Closed),
            Ok(Ok(n)) if n >= MAX_LINE_LENGTH && !buf.ends_with('\n') => {
                Err(TransportError::LineTooLong(MAX_LINE_LENGTH))
            }
            Ok(Ok(_)) => {
                let line = strip_terminator(&buf).to_string();
                trace!(line = %line, "Received line");
                Ok(line)
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.get_mut().shutdown().await {
                // The peer may already be gone.
                trace!(error = %e, "Shutdown after close");
            }
            debug!(socket = %self.address, "Closed scan daemon connection");
        }
    }
}

/// Strips one trailing `\n` or `\r\n`.
fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::UnixListener;

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator("220 ready\r\n"), "220 ready");
        assert_eq!(strip_terminator("220 ready\n"), "220 ready");
        assert_eq!(strip_terminator("220 ready"), "220 ready");
        assert_eq!(strip_terminator("a\tb\t\r\n"), "a\tb\t");
    }

    #[tokio::test]
    async fn test_connect_fails_without_listener() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sock");

        let err = UnixLineTransport::connect(&path, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_send_and_receive_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scand.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"220 ready\r\n").await.unwrap();
            let mut buf = vec![0u8; 64];
            let n = socket.read(&mut buf).await.unwrap();
            String::from_utf8(buf[..n].to_vec()).unwrap()
        });

        let mut transport = UnixLineTransport::connect(&path, Duration::from_secs(1))
            .await
            .unwrap();
        let greeting = transport.receive_line(Duration::from_secs(1)).await.unwrap();
        assert_eq!(greeting, "220 ready");

        transport.send_line("SCAN /tmp/x.tmp").await.unwrap();
        assert_eq!(server.await.unwrap(), "SCAN /tmp/x.tmp\r\n");

        transport.close().await;
        assert!(!transport.is_open());
        transport.close().await;
        assert!(matches!(
            transport.send_line("SCAN again").await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_overlong_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatty.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let flood = vec![b'A'; MAX_LINE_LENGTH + 1024];
            // The client stops reading at the limit, so this may fail.
            let _ = socket.write_all(&flood).await;
            let mut rest = Vec::new();
            let _ = socket.read_to_end(&mut rest).await;
        });

        let mut transport = UnixLineTransport::connect(&path, Duration::from_secs(1))
            .await
            .unwrap();
        let err = transport
            .receive_line(Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::LineTooLong(MAX_LINE_LENGTH)));

        transport.close().await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut line = vec![b'B'; MAX_LINE_LENGTH - 2];
            line.extend_from_slice(b"\r\n");
            socket.write_all(&line).await.unwrap();
        });

        let mut transport = UnixLineTransport::connect(&path, Duration::from_secs(1))
            .await
            .unwrap();
        let line = transport.receive_line(Duration::from_secs(5)).await.unwrap();
        assert_eq!(line.len(), MAX_LINE_LENGTH - 2);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_receive_timeout_is_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silent.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            drop(socket);
        });

        let mut transport = UnixLineTransport::connect(&path, Duration::from_secs(1))
            .await
            .unwrap();
        let err = transport
            .receive_line(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));

        server.await.unwrap();
        let err = transport
            .receive_line(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        transport.close().await;
    }
}
