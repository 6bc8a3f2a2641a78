//! Handler module - reply computation.
//!
//! Provides:
//! - [`ResponseHandler`] - user logic for application events
//! - [`Responder`] - maps inbound frames to reply frames
//!
//! # Example
//!
//! ```
//! use phoenix_mock_socket::handler::Responder;
//! use serde_json::{json, Value};
//!
//! let responder = Responder::new(|topic: &str, _event: &str, _payload: &Value| {
//!     json!({"response": {"topic": topic}})
//! });
//! # let _ = responder;
//! ```

mod responder;

pub use responder::{default_response, ResponseFn, ResponseHandler, Responder};
