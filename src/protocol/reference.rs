//! Opaque message and join references.
//!
//! Clients pick references freely. The JS client sends strings, other
//! clients send integers. The server never interprets them, it only echoes
//! them back in the exact JSON form they arrived in.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A message or join reference as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// String reference, e.g. `"1"`.
    Text(String),
    /// Numeric reference, e.g. `1`.
    Number(Number),
}

impl Reference {
    /// The reference as a string slice, if it is a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reference::Text(text) => Some(text),
            Reference::Number(_) => None,
        }
    }

    /// The reference as an integer, if it is an integral numeric reference.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Reference::Number(n) => n.as_i64(),
            Reference::Text(_) => None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Text(text) => f.write_str(text),
            Reference::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Reference {
    fn from(text: &str) -> Self {
        Reference::Text(text.to_owned())
    }
}

impl From<String> for Reference {
    fn from(text: String) -> Self {
        Reference::Text(text)
    }
}

impl From<i64> for Reference {
    fn from(n: i64) -> Self {
        Reference::Number(n.into())
    }
}

impl From<u64> for Reference {
    fn from(n: u64) -> Self {
        Reference::Number(n.into())
    }
}
