//! Mock server and runtime loops.
//!
//! [`MockSocket`] manages the lifecycle:
//! 1. Bind a listener at the URL through the transport
//! 2. Accept connections and register each one
//! 3. Read frames per connection and answer them
//! 4. Deliver server pushes on request
//!
//! # Example
//!
//! ```
//! use phoenix_mock_socket::transport::MemoryTransport;
//! use phoenix_mock_socket::MockSocket;
//! use serde_json::{json, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> phoenix_mock_socket::Result<()> {
//! let url = "ws://localhost:4000/socket/websocket";
//! let transport = MemoryTransport::new();
//!
//! let server = MockSocket::new();
//! server.initialise_with(&transport, url, |_topic: &str, _event: &str, payload: &Value| {
//!     json!({"response": {"echo": payload["message"]}})
//! })?;
//!
//! let mut client = transport.connect(url).await?;
//! client.send(r#"["1","1","room:lobby","phx_join",{}]"#).await?;
//! let reply = client.recv_frame().await?;
//! assert_eq!(reply.event, "phx_reply");
//!
//! let push = MockSocket::format_push_notification("room:lobby", "announce", &json!({"message": "hi"}))?;
//! server.send_push_notification(&push).await?;
//! assert_eq!(client.recv().await.as_deref(), Some(push.as_str()));
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};

use crate::codec::JsonCodec;
use crate::connections::ConnectionRegistry;
use crate::error::{MockSocketError, Result};
use crate::handler::{default_response, ResponseHandler, Responder};
use crate::protocol::{Frame, Reference};
use crate::transport::{BindError, ConnectionId, Listener, PeerConnection, Transport};

/// Where a push notification is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushTarget {
    /// The most recently accepted connection that is still open.
    #[default]
    Active,
    /// A specific connection.
    Connection(ConnectionId),
    /// Every open connection.
    All,
}

/// A mock Phoenix Channels server.
///
/// Answers `phx_join` and `heartbeat` automatically and passes every other
/// event to the response handler given at initialisation. All listeners
/// bound through one `MockSocket` share its connection registry.
///
/// Dropping the `MockSocket` stops its tasks and releases the URLs.
pub struct MockSocket {
    /// Open connections across all listeners.
    connections: Arc<ConnectionRegistry>,
    /// One accept task per bound listener.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MockSocket {
    /// Create a server with no listener bound yet.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(ConnectionRegistry::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Bind at `url` and answer application events with the default
    /// acknowledgement `{"response": {}, "status": "ok"}`.
    ///
    /// See [`MockSocket::initialise_with`].
    pub fn initialise<T>(&self, transport: &T, url: &str) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        self.initialise_with(transport, url, default_response)
    }

    /// Bind at `url` and answer application events with `handler`.
    ///
    /// If a listener is already bound at `url` the call logs a warning and
    /// returns `Ok(())`; whatever was bound first keeps serving.
    ///
    /// # Errors
    ///
    /// - [`MockSocketError::NoRuntime`] if called outside a Tokio runtime;
    ///   nothing is bound in that case
    /// - [`MockSocketError::Bind`] for any bind failure other than the
    ///   address being in use
    pub fn initialise_with<T, H>(&self, transport: &T, url: &str, handler: H) -> Result<()>
    where
        T: Transport + ?Sized,
        H: ResponseHandler,
    {
        let runtime = tokio::runtime::Handle::try_current()?;

        let listener = match transport.bind(url) {
            Ok(listener) => listener,
            Err(BindError::AddressInUse(url)) => {
                tracing::warn!("A mock server is already listening on {}", url);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Mock server listening on {}", url);

        let task = runtime.spawn(Self::accept_loop(
            listener,
            Responder::new(handler),
            self.connections.clone(),
        ));
        self.tasks().push(task);

        Ok(())
    }

    /// Accept loop - registers connections and spawns a task for each.
    async fn accept_loop(
        mut listener: Listener,
        responder: Responder,
        registry: Arc<ConnectionRegistry>,
    ) {
        // Connection tasks are aborted together with this task.
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let Some(conn) = accepted else { break };
                    tracing::debug!("Accepted connection {} on {}", conn.id(), listener.url());
                    registry.add(conn.sender()).await;
                    let _ = connections.spawn(Self::connection_loop(
                        conn,
                        responder.clone(),
                        registry.clone(),
                    ));
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        while connections.join_next().await.is_some() {}
    }

    /// Read loop for one connection - answers frames in arrival order.
    async fn connection_loop(
        mut conn: PeerConnection,
        responder: Responder,
        registry: Arc<ConnectionRegistry>,
    ) {
        let id = conn.id();
        let sender = conn.sender();

        while let Some(text) = conn.recv().await {
            let Some(reply) = Self::dispatch_frame(id, &text, &responder) else {
                continue;
            };
            if let Err(e) = sender.send(reply).await {
                tracing::error!("Failed to reply on connection {}: {}", id, e);
                break;
            }
        }

        let _ = registry.remove(id).await;
        tracing::debug!("Connection {} closed", id);
    }

    /// Decode one inbound frame and compute the encoded reply.
    ///
    /// Malformed frames are dropped with a warning.
    fn dispatch_frame(id: ConnectionId, text: &str, responder: &Responder) -> Option<String> {
        let frame = match JsonCodec::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping frame from connection {}: {}", id, e);
                return None;
            }
        };

        tracing::debug!(
            "Connection {} received {} on {} (ref {:?})",
            id,
            frame.event,
            frame.topic,
            frame.message_ref
        );

        match JsonCodec::encode(&responder.reply_to(&frame)) {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::error!("Failed to encode reply to {}: {}", frame.event, e);
                None
            }
        }
    }

    /// Format an unprompted push: `[null, null, topic, event, payload]`.
    ///
    /// Needs no connection, so pushes can be prepared before a client
    /// connects.
    pub fn format_push_notification<T: Serialize + ?Sized>(
        topic: &str,
        event: &str,
        payload: &T,
    ) -> Result<String> {
        let frame = Frame::push(topic, event, serde_json::to_value(payload)?);
        JsonCodec::encode(&frame)
    }

    /// Format a push scoped to a join: `[null, join_ref, topic, event, payload]`.
    ///
    /// `join_ref` is the reference the client used when it joined `topic`.
    pub fn format_push_notification_with_join_ref<T: Serialize + ?Sized>(
        join_ref: impl Into<Reference>,
        topic: &str,
        event: &str,
        payload: &T,
    ) -> Result<String> {
        let payload = serde_json::to_value(payload)?;
        let frame = Frame::push_with_join_ref(join_ref, topic, event, payload);
        JsonCodec::encode(&frame)
    }

    /// Send a formatted push to the active connection.
    ///
    /// # Errors
    ///
    /// Returns [`MockSocketError::NoActiveConnection`] if no client is
    /// connected.
    pub async fn send_push_notification(&self, message: &str) -> Result<()> {
        self.send_push_notification_to(PushTarget::Active, message)
            .await
            .map(|_| ())
    }

    /// Send a formatted push to `target`.
    ///
    /// Returns the number of connections the message was delivered to.
    ///
    /// # Errors
    ///
    /// - [`MockSocketError::NoActiveConnection`] for `Active` or `All` with
    ///   no client connected
    /// - [`MockSocketError::UnknownConnection`] for an ID that is not open
    /// - [`MockSocketError::ConnectionClosed`] if a single target went away
    pub async fn send_push_notification_to(
        &self,
        target: PushTarget,
        message: &str,
    ) -> Result<usize> {
        match target {
            PushTarget::Active => {
                let sender = self
                    .connections
                    .active_sender()
                    .await
                    .ok_or(MockSocketError::NoActiveConnection)?;
                sender.send(message.to_string()).await?;
                Ok(1)
            }
            PushTarget::Connection(id) => {
                let sender = self
                    .connections
                    .get(id)
                    .await
                    .ok_or(MockSocketError::UnknownConnection(id))?;
                sender.send(message.to_string()).await?;
                Ok(1)
            }
            PushTarget::All => {
                let senders = self.connections.all().await;
                if senders.is_empty() {
                    return Err(MockSocketError::NoActiveConnection);
                }

                let mut delivered = 0;
                for sender in senders {
                    match sender.send(message.to_string()).await {
                        Ok(()) => delivered += 1,
                        Err(e) => {
                            tracing::warn!("Skipping connection {} in broadcast: {}", sender.id(), e);
                        }
                    }
                }
                Ok(delivered)
            }
        }
    }

    /// Format a push and send it to the active connection.
    pub async fn push<T: Serialize + ?Sized>(
        &self,
        topic: &str,
        event: &str,
        payload: &T,
    ) -> Result<()> {
        let message = Self::format_push_notification(topic, event, payload)?;
        self.send_push_notification(&message).await
    }

    /// Wait until a client is connected and return the active connection.
    pub async fn wait_for_connection(&self) -> Result<ConnectionId> {
        self.connections.wait_for_active().await
    }

    /// Get the active connection, if any.
    pub fn active_connection(&self) -> Option<ConnectionId> {
        self.connections.active()
    }

    /// Get the number of open connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.len().await
    }

    /// Stop all tasks and release every bound URL.
    ///
    /// Connections are dropped, so clients see their streams end.
    pub async fn shutdown(&self) {
        let tasks = std::mem::take(&mut *self.tasks());
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }
        self.connections.clear().await;
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        for task in self.tasks().iter() {
            task.abort();
        }
    }
}
