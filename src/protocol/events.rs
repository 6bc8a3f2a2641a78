//! Event names and classification.
//!
//! Phoenix reserves a few event names for protocol plumbing. The mock server
//! answers the lifecycle ones itself and hands everything else to the
//! response function.

use serde_json::{json, Value};

/// Event a client sends to join a topic.
pub const PHX_JOIN: &str = "phx_join";

/// Keep-alive event, sent on the `phoenix` topic by the JS client.
pub const HEARTBEAT: &str = "heartbeat";

/// Event name the server uses for replies to lifecycle events.
pub const PHX_REPLY: &str = "phx_reply";

/// Reply status for a successful request.
pub const STATUS_OK: &str = "ok";

/// Protocol-level events answered automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `phx_join`
    Join,
    /// `heartbeat`
    Heartbeat,
}

impl LifecycleEvent {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Join => PHX_JOIN,
            LifecycleEvent::Heartbeat => HEARTBEAT,
        }
    }
}

/// Classification of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Join or heartbeat.
    Lifecycle(LifecycleEvent),
    /// Any event defined by the application under test.
    Application,
}

impl EventKind {
    /// Classify an event by name.
    pub fn classify(event: &str) -> Self {
        match event {
            PHX_JOIN => EventKind::Lifecycle(LifecycleEvent::Join),
            HEARTBEAT => EventKind::Lifecycle(LifecycleEvent::Heartbeat),
            _ => EventKind::Application,
        }
    }

    /// Check if this is a lifecycle event.
    #[inline]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, EventKind::Lifecycle(_))
    }
}

/// Payload of every lifecycle reply: `{"response": {}, "status": "ok"}`.
pub fn ok_reply_payload() -> Value {
    json!({
        "response": {},
        "status": STATUS_OK,
    })
}
