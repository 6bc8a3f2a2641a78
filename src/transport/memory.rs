//! In-process transport.
//!
//! [`MemoryTransport`] keeps a table of bound URLs. Binding registers the
//! sending side of the listener's connection queue; [`MemoryTransport::connect`]
//! looks the URL up, builds a channel pair and hands the server half to the
//! listener. The client half comes back as a [`ClientSocket`].
//!
//! A listener that has been dropped leaves a closed queue behind; the next
//! bind on that URL replaces it.
//!
//! # Example
//!
//! ```
//! use phoenix_mock_socket::transport::{MemoryTransport, Transport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> phoenix_mock_socket::Result<()> {
//! let transport = MemoryTransport::new();
//! let mut listener = transport.bind("ws://localhost/socket")?;
//!
//! let mut client = transport.connect("ws://localhost/socket").await?;
//! let mut peer = listener.accept().await.unwrap();
//!
//! client.send("hello").await?;
//! assert_eq!(peer.recv().await.as_deref(), Some("hello"));
//!
//! peer.sender().send("world".to_string()).await?;
//! assert_eq!(client.recv().await.as_deref(), Some("world"));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use super::{BindError, ConnectionId, Listener, PeerConnection, Transport};
use crate::codec::JsonCodec;
use crate::error::{MockSocketError, Result};
use crate::protocol::Frame;

/// Default capacity of every channel the transport creates.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Capacity of connection queues and per-connection frame channels.
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// In-process transport. Clones share the same URL table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Connection queue of each bound listener, by URL.
    listeners: Mutex<HashMap<String, mpsc::Sender<PeerConnection>>>,
    config: TransportConfig,
}

impl MemoryTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with the given configuration.
    pub fn with_config(config: TransportConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners: Mutex::default(),
                config,
            }),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    /// Check whether a live listener is bound at `url`.
    pub fn is_bound(&self, url: &str) -> bool {
        self.listeners()
            .get(url)
            .is_some_and(|queue| !queue.is_closed())
    }

    /// Open a client connection to the listener bound at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`MockSocketError::ConnectionRefused`] if nothing is listening
    /// there.
    pub async fn connect(&self, url: &str) -> Result<ClientSocket> {
        let queue = self
            .listeners()
            .get(url)
            .filter(|queue| !queue.is_closed())
            .cloned()
            .ok_or_else(|| MockSocketError::ConnectionRefused(url.to_string()))?;

        let capacity = self.inner.config.channel_capacity;
        let (to_server, server_inbound) = mpsc::channel(capacity);
        let (server_outbound, from_server) = mpsc::channel(capacity);

        let id = ConnectionId::next();
        let peer = PeerConnection::new(id, server_inbound, server_outbound);

        queue
            .send(peer)
            .await
            .map_err(|_| MockSocketError::ConnectionRefused(url.to_string()))?;

        tracing::debug!("Client {} connected to {}", id, url);

        Ok(ClientSocket {
            id,
            tx: to_server,
            rx: from_server,
        })
    }

    fn listeners(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, mpsc::Sender<PeerConnection>>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn bind(&self, url: &str) -> std::result::Result<Listener, BindError> {
        validate_url(url)?;

        let mut listeners = self.listeners();
        if listeners.get(url).is_some_and(|queue| !queue.is_closed()) {
            return Err(BindError::AddressInUse(url.to_string()));
        }

        let (tx, rx) = mpsc::channel(self.inner.config.channel_capacity);
        listeners.insert(url.to_string(), tx);

        Ok(Listener::new(url, rx))
    }
}

/// Accept `ws://` and `wss://` URLs with a non-empty host part.
fn validate_url(url: &str) -> std::result::Result<(), BindError> {
    let rest = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"));

    match rest {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(()),
        _ => Err(BindError::InvalidUrl(url.to_string())),
    }
}

/// Client side of an in-memory connection, driven by test code.
///
/// Dropping it closes the connection.
#[derive(Debug)]
pub struct ClientSocket {
    id: ConnectionId,
    tx: mpsc::Sender<String>,
    rx: mpsc::Receiver<String>,
}

impl ClientSocket {
    /// Get the connection ID the server sees.
    #[inline]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Send raw text to the server.
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        self.tx
            .send(text.into())
            .await
            .map_err(|_| MockSocketError::ConnectionClosed)
    }

    /// Encode and send a frame.
    pub async fn send_frame(&self, frame: &Frame) -> Result<()> {
        self.send(JsonCodec::encode(frame)?).await
    }

    /// Wait for the next text frame from the server.
    ///
    /// Returns `None` once the server side is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Wait for the next frame from the server and decode it.
    ///
    /// # Errors
    ///
    /// Returns [`MockSocketError::ConnectionClosed`] if the server side is
    /// gone, or [`MockSocketError::MalformedFrame`] if the text does not
    /// decode.
    pub async fn recv_frame(&mut self) -> Result<Frame> {
        let text = self.recv().await.ok_or(MockSocketError::ConnectionClosed)?;
        JsonCodec::decode(text)
    }

    /// Return a frame that has already arrived, without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Close the connection.
    pub fn close(self) {
        tracing::debug!("Client {} closed", self.id);
    }
}
