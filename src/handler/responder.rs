//! Reply computation for inbound frames.
//!
//! Lifecycle events (`phx_join`, `heartbeat`) always succeed with a
//! `phx_reply` carrying `{"response": {}, "status": "ok"}`. Every other event
//! is echoed back with whatever payload the response handler returns for it.
//!
//! # Example
//!
//! ```
//! use phoenix_mock_socket::handler::Responder;
//! use serde_json::{json, Value};
//!
//! let responder = Responder::new(|_topic: &str, _event: &str, payload: &Value| {
//!     json!({"response": {"echo": payload["message"]}})
//! });
//!
//! let reply = responder
//!     .respond(r#"["2","1","room:lobby","say",{"message":"hi"}]"#)
//!     .unwrap();
//! assert_eq!(reply, r#"["2","1","room:lobby","say",{"response":{"echo":"hi"}}]"#);
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::codec::{FrameSource, JsonCodec};
use crate::error::Result;
use crate::protocol::{ok_reply_payload, EventKind, Frame, PHX_REPLY};

/// Computes the reply payload for an application event.
///
/// Receives the inbound topic, event name and payload. Implemented for every
/// `Fn(&str, &str, &Value) -> Value`.
pub trait ResponseHandler: Send + Sync + 'static {
    /// Return the payload to send back.
    fn respond(&self, topic: &str, event: &str, payload: &Value) -> Value;
}

impl<F> ResponseHandler for F
where
    F: Fn(&str, &str, &Value) -> Value + Send + Sync + 'static,
{
    fn respond(&self, topic: &str, event: &str, payload: &Value) -> Value {
        self(topic, event, payload)
    }
}

/// Shared response handler.
pub type ResponseFn = Arc<dyn ResponseHandler>;

/// Default response handler: a generic acknowledgement.
///
/// Always returns `{"response": {}, "status": "ok"}`.
pub fn default_response(_topic: &str, _event: &str, _payload: &Value) -> Value {
    json!({
        "response": {},
        "status": "ok",
    })
}

/// Turns inbound frames into reply frames.
#[derive(Clone)]
pub struct Responder {
    handler: ResponseFn,
}

impl Responder {
    /// Create a responder around a response handler.
    pub fn new<H: ResponseHandler>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Create a responder from an already shared handler.
    pub fn from_shared(handler: ResponseFn) -> Self {
        Self { handler }
    }

    /// Build the reply to an inbound frame.
    ///
    /// The reply always carries the inbound message reference, join
    /// reference and topic. The handler's payload is used unmodified.
    pub fn reply_to(&self, frame: &Frame) -> Frame {
        match frame.kind() {
            EventKind::Lifecycle(_) => frame.reply(PHX_REPLY, ok_reply_payload()),
            EventKind::Application => {
                let payload = self
                    .handler
                    .respond(&frame.topic, &frame.event, &frame.payload);
                frame.reply(frame.event.as_str(), payload)
            }
        }
    }

    /// Decode an inbound frame, compute the reply and encode it.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if the input does not decode.
    pub fn respond<S: FrameSource>(&self, inbound: S) -> Result<String> {
        let frame = JsonCodec::decode(inbound)?;
        JsonCodec::encode(&self.reply_to(&frame))
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new(default_response)
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder").finish_non_exhaustive()
    }
}
