//! Protocol module - frame type and event classification.
//!
//! This module implements the Phoenix Channels V2 message model:
//! - Five-field frame with positional JSON serialization
//! - Opaque string or numeric references
//! - Reserved event names and lifecycle classification

mod events;
mod frame;
mod reference;

pub use events::{
    ok_reply_payload, EventKind, LifecycleEvent, HEARTBEAT, PHX_JOIN, PHX_REPLY, STATUS_OK,
};
pub use frame::Frame;
pub use reference::Reference;
