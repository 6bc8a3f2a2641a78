//! Lobby demo - a scripted client talking to the mock server.
//!
//! This demo shows:
//! - Initialising the mock with a response handler
//! - The join/heartbeat handshake answered automatically
//! - An application event answered by the handler
//! - An unprompted push from the server
//!
//! Run with `RUST_LOG=phoenix_mock_socket=debug cargo run --example lobby`
//! to see the server side logs.

use phoenix_mock_socket::transport::MemoryTransport;
use phoenix_mock_socket::{Frame, MockSocket};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

const URL: &str = "ws://localhost:4000/socket/websocket";

/// Reply to `say` with the next line of the rhyme.
fn rhyme(_topic: &str, _event: &str, payload: &Value) -> Value {
    let next = match payload["message"].as_str() {
        Some("One fish") => "Two fish",
        Some("Red fish") => "Blue fish",
        _ => "Unknown fish",
    };
    json!({ "response": { "message": next } })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let transport = MemoryTransport::new();
    let server = MockSocket::new();
    server.initialise_with(&transport, URL, rhyme)?;

    // Test suites often initialise more than once; this only logs a warning.
    server.initialise_with(&transport, URL, rhyme)?;

    let mut client = transport.connect(URL).await?;

    let join = Frame::new(Some("1".into()), Some("1".into()), "room:lobby", "phx_join", json!({}));
    client.send_frame(&join).await?;
    println!("join      -> {}", client.recv().await.unwrap_or_default());

    let heartbeat = Frame::new(Some("2".into()), None, "phoenix", "heartbeat", json!({}));
    client.send_frame(&heartbeat).await?;
    println!("heartbeat -> {}", client.recv().await.unwrap_or_default());

    for (i, line) in ["One fish", "Red fish"].into_iter().enumerate() {
        let say = Frame::new(
            Some((i + 3).to_string().into()),
            Some("1".into()),
            "room:lobby",
            "say",
            json!({ "message": line }),
        );
        client.send_frame(&say).await?;
        println!("say       -> {}", client.recv().await.unwrap_or_default());
    }

    let push = MockSocket::format_push_notification(
        "room:lobby",
        "announce",
        &json!({ "message": "A new fish joined" }),
    )?;
    server.send_push_notification(&push).await?;
    println!("push      -> {}", client.recv().await.unwrap_or_default());

    server.shutdown().await;
    Ok(())
}
