//! Codec module - frame encoding/decoding.
//!
//! - [`JsonCodec`] - Phoenix V2 JSON array format
//! - [`FrameSource`] - inputs the decoder accepts (text or parsed JSON)
//!
//! # Design
//!
//! The codec is a marker struct with static methods rather than a trait
//! object, so call sites read `JsonCodec::encode(&frame)`.

mod json;

pub use json::{FrameSource, JsonCodec};
