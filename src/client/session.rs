//! Client session
//!
//! A session pairs an accepted username with the outbound handle used to
//! reach that client. The handle feeds a writer task that owns the socket's
//! write half, so every line for one client is written in the order it was
//! queued, whether it came from the client's own handler or a broadcast.

use log::{debug, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ChatError, Result};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lines that may wait for one client before it counts as stalled.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 1024;

/// Write-handle for one connection.
///
/// Cloning is cheap. The queue is bounded: when it is full the client is
/// not keeping up, the handle is closed and `send` fails. Once closed, or
/// once the writer task has stopped, `send` fails with an error.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<String>,
    closed: CancellationToken,
}

impl Outbound {
    /// Creates a handle together with the receiving end of its queue.
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        Self::with_capacity(OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let closed = CancellationToken::new();
        (Self { tx, closed }, rx)
    }

    /// Spawns a writer task draining the queue into `writer`.
    ///
    /// The task ends when every handle is dropped (the writer is then shut
    /// down), when a write fails, or when the handle is closed.
    pub fn spawn_writer<W>(writer: W, peer: String) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, rx) = Self::channel();
        let closed = outbound.closed.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = closed.cancelled() => debug!("Stopped writing to {}", peer),
                _ = write_lines(writer, rx, &peer) => {}
            }
        });
        (outbound, task)
    }

    /// Queue one line; the newline is appended by the writer.
    ///
    /// Never waits. A full queue closes the handle and reports
    /// [`ChatError::Backlogged`].
    pub fn send(&self, line: impl Into<String>) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(ChatError::ConnectionClosed);
        }

        match self.tx.try_send(line.into()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.close();
                Err(ChatError::Backlogged)
            }
            Err(TrySendError::Closed(_)) => Err(ChatError::ConnectionClosed),
        }
    }

    /// Stops the writer without flushing what is still queued.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves once the handle has been closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::Receiver<String>, peer: &str)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        let mut frame = line.into_bytes();
        frame.push(b'\n');

        if let Err(e) = writer.write_all(&frame).await {
            warn!("Failed to write to {}: {}", peer, e);
            return;
        }
        if let Err(e) = writer.flush().await {
            warn!("Failed to flush to {}: {}", peer, e);
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of {} failed: {}", peer, e);
    }
}

/// One accepted client as stored in the registry.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    username: String,
    outbound: Outbound,
}

impl Session {
    pub fn new(username: impl Into<String>, outbound: Outbound) -> Self {
        Self {
            id: SessionId::next(),
            username: username.into(),
            outbound,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub fn send(&self, line: impl Into<String>) -> Result<()> {
        self.outbound.send(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[test]
    fn session_ids_are_unique() {
        let (outbound, _rx) = Outbound::channel();
        let a = Session::new("alice", outbound.clone());
        let b = Session::new("alice", outbound);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn send_fails_once_receiver_is_gone() {
        let (outbound, rx) = Outbound::channel();
        assert!(outbound.send("hi").is_ok());

        drop(rx);

        assert!(outbound.is_closed());
        assert!(matches!(outbound.send("hi"), Err(ChatError::ConnectionClosed)));
    }

    #[test]
    fn full_queue_closes_the_handle() {
        let (outbound, _rx) = Outbound::with_capacity(2);
        outbound.send("one").unwrap();
        outbound.send("two").unwrap();

        assert!(matches!(outbound.send("three"), Err(ChatError::Backlogged)));
        assert!(outbound.is_closed());
        assert!(matches!(outbound.send("four"), Err(ChatError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn stalled_reader_backlogs_and_stops_the_writer() {
        // The peer never reads, so the writer blocks once the pipe is full.
        let (_client, server) = tokio::io::duplex(64);
        let (outbound, task) = Outbound::spawn_writer(server, "stalled".to_string());

        let line = "x".repeat(100);
        let backlogged = (0..=OUTBOUND_QUEUE_CAPACITY + 1)
            .map(|_| outbound.send(line.as_str()))
            .any(|result| matches!(result, Err(ChatError::Backlogged)));

        assert!(backlogged);
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("writer should stop once closed")
            .unwrap();
    }

    #[tokio::test]
    async fn writer_appends_newlines_in_order() {
        let (client, server) = tokio::io::duplex(1024);
        let (outbound, task) = Outbound::spawn_writer(server, "test".to_string());

        outbound.send("first").unwrap();
        outbound.send("second").unwrap();
        drop(outbound);
        task.await.unwrap();

        let mut lines = BufReader::new(client).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}
