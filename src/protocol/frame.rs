//! Frame struct with typed accessors.
//!
//! Represents one Phoenix Channels message. On the wire a frame is a JSON
//! array with five positional fields:
//!
//! ```text
//! [message_ref, join_ref, topic, event, payload]
//! ```
//!
//! `Frame` keeps the fields named in Rust and converts to and from the
//! positional tuple through serde, so `serde_json` produces the exact wire
//! shape. References are [`Reference`] values: strings and numbers both
//! survive a decode/encode cycle unchanged.
//!
//! # Example
//!
//! ```
//! use phoenix_mock_socket::protocol::Frame;
//! use serde_json::json;
//!
//! let join = Frame::new(
//!     Some("1".into()),
//!     Some("1".into()),
//!     "room:lobby",
//!     "phx_join",
//!     json!({}),
//! );
//! let reply = join.reply("phx_reply", json!({"response": {}, "status": "ok"}));
//!
//! assert_eq!(reply.message_ref, Some("1".into()));
//! assert_eq!(reply.topic, "room:lobby");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::EventKind;
use super::reference::Reference;

/// Positional wire representation of a frame.
type WireTuple = (Option<Reference>, Option<Reference>, String, String, Value);

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireTuple", into = "WireTuple")]
pub struct Frame {
    /// Client chosen reference echoed in the reply. `None` for server pushes.
    pub message_ref: Option<Reference>,
    /// Reference chosen by the client when it joined the topic.
    pub join_ref: Option<Reference>,
    /// Channel topic, e.g. `room:lobby`.
    pub topic: String,
    /// Event name, e.g. `phx_join` or an application event.
    pub event: String,
    /// Arbitrary structured payload.
    pub payload: Value,
}

impl Frame {
    /// Create a new frame from its five fields.
    pub fn new(
        message_ref: Option<Reference>,
        join_ref: Option<Reference>,
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            message_ref,
            join_ref,
            topic: topic.into(),
            event: event.into(),
            payload,
        }
    }

    /// Create an unprompted server push with no references.
    pub fn push(topic: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self::new(None, None, topic, event, payload)
    }

    /// Create an unprompted server push scoped to a join reference.
    pub fn push_with_join_ref(
        join_ref: impl Into<Reference>,
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(None, Some(join_ref.into()), topic, event, payload)
    }

    /// Build the reply to this frame.
    ///
    /// Both references and the topic are copied from `self`.
    pub fn reply(&self, event: impl Into<String>, payload: Value) -> Self {
        Self {
            message_ref: self.message_ref.clone(),
            join_ref: self.join_ref.clone(),
            topic: self.topic.clone(),
            event: event.into(),
            payload,
        }
    }

    /// Classify the event carried by this frame.
    #[inline]
    pub fn kind(&self) -> EventKind {
        EventKind::classify(&self.event)
    }

    /// Check if this frame is a server push (no message reference).
    #[inline]
    pub fn is_push(&self) -> bool {
        self.message_ref.is_none()
    }
}

impl From<WireTuple> for Frame {
    fn from((message_ref, join_ref, topic, event, payload): WireTuple) -> Self {
        Self {
            message_ref,
            join_ref,
            topic,
            event,
            payload,
        }
    }
}

impl From<Frame> for WireTuple {
    fn from(frame: Frame) -> Self {
        (
            frame.message_ref,
            frame.join_ref,
            frame.topic,
            frame.event,
            frame.payload,
        )
    }
}
