//! Error types for phoenix-mock-socket.

use thiserror::Error;

use crate::transport::{BindError, ConnectionId};

/// Main error type for all mock socket operations.
#[derive(Debug, Error)]
pub enum MockSocketError {
    /// JSON serialization error while encoding a frame.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inbound text that is not a valid `[ref, join_ref, topic, event, payload]` tuple.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Binding the listener failed for a reason other than the address being in use.
    #[error("Bind failed: {0}")]
    Bind(#[from] BindError),

    /// A push was requested but no client is connected.
    #[error("No active connection")]
    NoActiveConnection,

    /// A push was addressed to a connection that is not registered.
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// Nothing is listening at the URL a client tried to connect to.
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// The server was started outside a Tokio runtime.
    #[error("No Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// Connection closed while sending.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using MockSocketError.
pub type Result<T> = std::result::Result<T, MockSocketError>;
