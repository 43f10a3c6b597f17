//! Per-connection handling.
//!
//! # Responsibilities
//! - Generate unique connection IDs for log correlation
//! - Track each connection's lifetime (metrics, optional concurrency permit)
//! - Perform the single read / fixed write / close exchange

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::OwnedSemaphorePermit;

use crate::observability::metrics;

/// The reply written to every connection. 78 bytes, 13-byte body.
pub const RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 13\r\n\r\nHello, World!";

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough: only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Guard that spans one accepted connection.
///
/// Holds the concurrency permit (when the server is capped) so the slot is
/// released even if the handler task panics.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    _permit: Option<OwnedSemaphorePermit>,
}

impl ConnectionGuard {
    pub fn new(permit: Option<OwnedSemaphorePermit>) -> Self {
        metrics::record_accepted();
        Self {
            id: ConnectionId::new(),
            _permit: permit,
        }
    }

    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        metrics::record_closed();
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Serve one connection: read once, reply with [`RESPONSE`], close.
///
/// A read error skips the reply. Errors never leave this function; the
/// stream is shut down on every path and dropped on return.
pub async fn handle_connection<S>(mut stream: S, id: ConnectionId, read_buffer_size: usize)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; read_buffer_size];

    match stream.read(&mut buf).await {
        Ok(n) => {
            tracing::trace!(connection_id = %id, bytes = n, "Request read");
            if let Err(e) = stream.write_all(RESPONSE).await {
                metrics::record_connection_error("write");
                tracing::warn!(connection_id = %id, error = %e, "Could not write response");
            }
        }
        Err(e) => {
            metrics::record_connection_error("read");
            tracing::debug!(connection_id = %id, error = %e, "Read failed, closing connection");
        }
    }

    if let Err(e) = stream.shutdown().await {
        metrics::record_connection_error("close");
        tracing::debug!(connection_id = %id, error = %e, "Could not close connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Stream whose reads always fail; records writes and shutdown.
    #[derive(Default)]
    struct BrokenReadStream {
        written: Vec<u8>,
        shut_down: bool,
    }

    impl AsyncRead for BrokenReadStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        }
    }

    impl AsyncWrite for BrokenReadStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.written.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.shut_down = true;
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
        assert_eq!(id1.to_string(), format!("conn-{}", id1.as_u64()));
    }

    #[test]
    fn response_is_byte_exact() {
        assert_eq!(RESPONSE.len(), 78);
        assert!(RESPONSE.ends_with(b"\r\n\r\nHello, World!"));
        let body_start = RESPONSE.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        assert_eq!(RESPONSE.len() - body_start, 13);
    }

    #[tokio::test]
    async fn replies_after_reading_request() {
        let (mut client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(handle_connection(server, ConnectionId::new(), 1024));

        client.write_all(b"GET / HTTP/1.1\r\nHost: test\r\n\r\n").await.unwrap();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();

        assert_eq!(reply, RESPONSE);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn replies_when_client_sends_nothing() {
        let (mut client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(handle_connection(server, ConnectionId::new(), 1024));

        client.shutdown().await.unwrap();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();

        assert_eq!(reply, RESPONSE);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn read_error_closes_without_reply() {
        let mut stream = BrokenReadStream::default();
        handle_connection(&mut stream, ConnectionId::new(), 1024).await;

        assert!(stream.written.is_empty());
        assert!(stream.shut_down);
    }

    #[test]
    fn guard_releases_permit_on_drop() {
        let limit = std::sync::Arc::new(tokio::sync::Semaphore::new(1));
        let permit = limit.clone().try_acquire_owned().unwrap();
        let guard = ConnectionGuard::new(Some(permit));
        assert_eq!(limit.available_permits(), 0);

        drop(guard);
        assert_eq!(limit.available_permits(), 1);
    }
}
