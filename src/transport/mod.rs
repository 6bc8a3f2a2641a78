//! Transport module - virtual listeners and peer connections.
//!
//! The responder does not move bytes itself. It binds a [`Listener`]
//! through a [`Transport`], takes [`PeerConnection`]s from it, reads text
//! frames from each peer and writes replies through a [`PeerSender`].
//!
//! Listeners and connections are plain channel pairs, so any transport
//! (in-memory, a real WebSocket acceptor, ...) can produce them. The crate
//! ships [`MemoryTransport`], which keeps everything in-process.
//!
//! # Example
//!
//! ```
//! use phoenix_mock_socket::transport::{BindError, MemoryTransport, Transport};
//!
//! let transport = MemoryTransport::new();
//! let _listener = transport.bind("ws://localhost:4000/socket/websocket").unwrap();
//!
//! let again = transport.bind("ws://localhost:4000/socket/websocket");
//! assert!(matches!(again, Err(BindError::AddressInUse(_))));
//! ```

mod memory;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::error::{MockSocketError, Result};

pub use memory::{ClientSocket, MemoryTransport, TransportConfig, DEFAULT_CHANNEL_CAPACITY};

/// Last connection ID handed out in this process.
static LAST_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of one accepted connection.
///
/// IDs are unique across every transport in the process and increase
/// monotonically, so a newer connection always compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh ID. Transports call this once per connection.
    pub fn next() -> Self {
        Self(LAST_CONNECTION_ID.fetch_add(1, Ordering::Relaxed) + 1)
    }

    #[cfg(test)]
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failure to bind a listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// Another listener is already bound to this URL.
    #[error("A mock server is already listening on {0}")]
    AddressInUse(String),

    /// The URL is not a `ws://` or `wss://` address.
    #[error("Invalid url: {0}")]
    InvalidUrl(String),
}

/// Something that can bind virtual listeners.
pub trait Transport: Send + Sync {
    /// Bind a listener at `url`.
    ///
    /// Fails with [`BindError::AddressInUse`] if a listener is already bound
    /// there.
    fn bind(&self, url: &str) -> std::result::Result<Listener, BindError>;
}

/// A bound listener. Dropping it releases the URL.
#[derive(Debug)]
pub struct Listener {
    url: String,
    incoming: mpsc::Receiver<PeerConnection>,
}

impl Listener {
    /// Create a listener fed by `incoming`.
    pub fn new(url: impl Into<String>, incoming: mpsc::Receiver<PeerConnection>) -> Self {
        Self {
            url: url.into(),
            incoming,
        }
    }

    /// Wait for the next connection.
    ///
    /// Returns `None` once the transport stops delivering connections.
    pub async fn accept(&mut self) -> Option<PeerConnection> {
        self.incoming.recv().await
    }

    /// Get the bound URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Server side of one accepted connection.
#[derive(Debug)]
pub struct PeerConnection {
    inbound: mpsc::Receiver<String>,
    sender: PeerSender,
}

impl PeerConnection {
    /// Create a connection from its inbound and outbound channels.
    pub fn new(
        id: ConnectionId,
        inbound: mpsc::Receiver<String>,
        outbound: mpsc::Sender<String>,
    ) -> Self {
        Self {
            inbound,
            sender: PeerSender { id, tx: outbound },
        }
    }

    /// Get the connection ID.
    #[inline]
    pub fn id(&self) -> ConnectionId {
        self.sender.id
    }

    /// Wait for the next inbound text frame.
    ///
    /// Returns `None` when the peer has closed the connection.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Get a handle for writing to this peer.
    pub fn sender(&self) -> PeerSender {
        self.sender.clone()
    }
}

/// Write half of a [`PeerConnection`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PeerSender {
    id: ConnectionId,
    tx: mpsc::Sender<String>,
}

impl PeerSender {
    /// Get the connection ID.
    #[inline]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Send a text frame to the peer.
    pub async fn send(&self, text: String) -> Result<()> {
        self.tx
            .send(text)
            .await
            .map_err(|_| MockSocketError::ConnectionClosed)
    }

    /// Check if the peer has gone away.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
