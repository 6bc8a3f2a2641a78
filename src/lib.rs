//! # phoenix-mock-socket
//!
//! Mock Phoenix Channels server for client-side test suites.
//!
//! The mock binds a virtual listener at the URL your client connects to,
//! answers the protocol's lifecycle events itself and lets the test decide
//! how application events are answered.
//!
//! ## Architecture
//!
//! - **Transport**: binds listeners and carries text frames
//!   ([`transport::MemoryTransport`] keeps everything in-process)
//! - **Responder**: decodes `[ref, join_ref, topic, event, payload]` frames,
//!   auto-acknowledges `phx_join` and `heartbeat`, delegates everything else
//!   to a response handler
//!
//! ## Example
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
//!     let answer = match payload["message"].as_str() {
//!         Some("One fish") => "Two fish",
//!         _ => "Unknown fish",
//!     };
//!     json!({"response": {"message": answer}})
//! })?;
//!
//! let mut client = transport.connect(url).await?;
//! client.send(r#"["2","1","room:lobby","say",{"message":"One fish"}]"#).await?;
//!
//! let reply = client.recv_frame().await?;
//! assert_eq!(reply.payload, json!({"response": {"message": "Two fish"}}));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod transport;

mod connections;
mod server;

pub use error::{MockSocketError, Result};
pub use protocol::{Frame, Reference};
pub use server::{MockSocket, PushTarget};
