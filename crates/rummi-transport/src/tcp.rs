//! Newline-delimited TCP transport.
//!
//! Each message is one line: the payload followed by `\n`. Payloads must
//! not contain a newline themselves; the JSON codec never emits one.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Longest line accepted from a peer, newline included.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// The address actually bound, useful after binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        let conn = TcpConnection::from_stream(stream, addr);
        tracing::debug!(id = %conn.id, %addr, "accepted TCP connection");
        Ok(conn)
    }

    async fn shutdown(self) -> Result<(), Self::Error> {
        let addr = self.local_addr()?;
        drop(self.listener);
        tracing::info!(%addr, "TCP transport closed");
        Ok(())
    }
}

/// A single TCP connection with independent read and write halves.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpConnection {
    /// Opens a connection to a server.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let peer = stream.peer_addr().map_err(TransportError::ConnectFailed)?;
        let conn = Self::from_stream(stream, peer);
        tracing::debug!(id = %conn.id, %peer, "connected");
        Ok(conn)
    }

    fn from_stream(stream: TcpStream, peer: SocketAddr) -> Self {
        // Lines are small and latency matters more than throughput.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "could not disable Nagle");
        }
        let (read, write) = stream.into_split();
        Self {
            id: ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)),
            peer,
            reader: Mutex::new(BufReader::new(read)),
            writer: Mutex::new(write),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        loop {
            let mut line = Vec::new();
            let read = (&mut *reader)
                .take(MAX_FRAME_LEN as u64)
                .read_until(b'\n', &mut line)
                .await
                .map_err(TransportError::ReceiveFailed)?;

            if read == 0 {
                return Ok(None);
            }
            if line.last() != Some(&b'\n') {
                if read >= MAX_FRAME_LEN {
                    return Err(TransportError::FrameTooLong(MAX_FRAME_LEN));
                }
                // Peer closed mid-line; deliver what we have.
                return Ok(Some(line));
            }

            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
