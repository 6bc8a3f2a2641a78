//! JSON codec for Phoenix V2 frames.
//!
//! Frames travel as text: a JSON array with five positional elements.
//! Decoding accepts either that text or an already parsed JSON value, and
//! always normalizes to a [`Frame`] before any field is read.
//!
//! # Example
//!
//! ```
//! use phoenix_mock_socket::codec::JsonCodec;
//! use phoenix_mock_socket::protocol::Frame;
//! use serde_json::json;
//!
//! let frame = Frame::push("room:lobby", "announce", json!({"message": "hi"}));
//! let text = JsonCodec::encode(&frame).unwrap();
//! assert_eq!(text, r#"[null,null,"room:lobby","announce",{"message":"hi"}]"#);
//!
//! let decoded = JsonCodec::decode(text.as_str()).unwrap();
//! assert_eq!(decoded, frame);
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MockSocketError, Result};
use crate::protocol::Frame;

/// Input accepted by [`JsonCodec::decode`].
///
/// Implemented for serialized text (`&str`, `String`), parsed JSON
/// (`Value`, `&Value`) and frames that are already decoded.
pub trait FrameSource {
    /// Normalize into a structured frame.
    fn into_frame(self) -> Result<Frame>;
}

impl FrameSource for &str {
    fn into_frame(self) -> Result<Frame> {
        serde_json::from_str(self).map_err(malformed)
    }
}

impl FrameSource for &String {
    fn into_frame(self) -> Result<Frame> {
        self.as_str().into_frame()
    }
}

impl FrameSource for String {
    fn into_frame(self) -> Result<Frame> {
        self.as_str().into_frame()
    }
}

impl FrameSource for Value {
    fn into_frame(self) -> Result<Frame> {
        serde_json::from_value(self).map_err(malformed)
    }
}

impl FrameSource for &Value {
    fn into_frame(self) -> Result<Frame> {
        Frame::deserialize(self).map_err(malformed)
    }
}

impl FrameSource for Frame {
    #[inline]
    fn into_frame(self) -> Result<Frame> {
        Ok(self)
    }
}

fn malformed(err: serde_json::Error) -> MockSocketError {
    MockSocketError::MalformedFrame(err.to_string())
}

/// JSON codec for frames.
///
/// `decode(encode(x)) == x` holds for every frame.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a frame to its wire text.
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be serialized.
    #[inline]
    pub fn encode(frame: &Frame) -> Result<String> {
        Ok(serde_json::to_string(frame)?)
    }

    /// Decode wire text or a parsed JSON value into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`MockSocketError::MalformedFrame`] if the input is not a
    /// five element array of the expected field types.
    #[inline]
    pub fn decode<S: FrameSource>(input: S) -> Result<Frame> {
        input.into_frame()
    }
}
