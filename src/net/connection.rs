//! Outbound connection establishment.
//!
//! # Responsibilities
//! - Resolve and connect to the request target with a deadline
//! - Generate unique connection IDs for tracing
//! - Hand the stream to the transfer driver, which writes in submission order

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::TcpStream;
use url::Url;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
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

/// An open client connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    stream: TcpStream,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}

/// Connect to the host and port of `url` (port 80 when absent).
pub async fn connect(url: &Url, timeout: Duration) -> std::io::Result<Connection> {
    let host = match url.host() {
        Some(url::Host::Ipv6(addr)) => addr.to_string(),
        Some(host) => host.to_string(),
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "URL has no host",
            ))
        }
    };
    let port = url.port_or_known_default().unwrap_or(80);

    let stream = match tokio::time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connect to {}:{} timed out after {:?}", host, port, timeout),
            ))
        }
    };
    stream.set_nodelay(true)?;
    let peer_addr = stream.peer_addr()?;

    let id = ConnectionId::new();
    tracing::debug!(connection_id = %id, peer_addr = %peer_addr, "Connection established");

    Ok(Connection {
        id,
        peer_addr,
        stream,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[tokio::test]
    async fn connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = Url::parse(&format!("http://{}/upload", addr)).unwrap();

        let conn = connect(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(conn.peer_addr(), addr);
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        assert!(connect(&url, Duration::from_secs(5)).await.is_err());
    }
}
