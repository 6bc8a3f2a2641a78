//! Integration tests for phoenix-mock-socket.
//!
//! These tests drive the mock server end to end through the in-memory
//! transport, the way a client under test would.

use phoenix_mock_socket::codec::JsonCodec;
use phoenix_mock_socket::transport::{BindError, ClientSocket, MemoryTransport, Transport};
use phoenix_mock_socket::{Frame, MockSocket, MockSocketError, PushTarget, Reference};
use serde_json::{json, Value};

const URL: &str = "ws://localhost8000/socket/websocket";

fn fish(_topic: &str, _event: &str, payload: &Value) -> Value {
    let answer = match payload["message"].as_str() {
        Some("One fish") => "Two fish",
        Some("Red fish") => "Blue fish",
        _ => "Unknown fish",
    };
    json!({ "response": { "message": answer } })
}

fn start(handler: fn(&str, &str, &Value) -> Value) -> (MockSocket, MemoryTransport) {
    let transport = MemoryTransport::new();
    let server = MockSocket::new();
    server.initialise_with(&transport, URL, handler).unwrap();
    (server, transport)
}

async fn request(client: &mut ClientSocket, text: &str) -> Value {
    client.send(text).await.unwrap();
    serde_json::from_str(&client.recv().await.unwrap()).unwrap()
}

/// Join on a topic is acknowledged with phx_reply.
#[tokio::test]
async fn test_join_scenario() {
    let (_server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();

    let reply = request(&mut client, r#"["1","1","room:lobby","phx_join",{}]"#).await;
    assert_eq!(
        reply,
        json!(["1", "1", "room:lobby", "phx_reply", {"response": {}, "status": "ok"}])
    );
}

/// Application events go through the response handler.
#[tokio::test]
async fn test_application_event_scenario() {
    let (_server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();

    let _ = request(&mut client, r#"["1","1","room:lobby","phx_join",{}]"#).await;

    let reply = request(
        &mut client,
        r#"["2","1","room:lobby","say",{"message":"One fish"}]"#,
    )
    .await;
    assert_eq!(
        reply,
        json!(["2", "1", "room:lobby", "say", {"response": {"message": "Two fish"}}])
    );

    let reply = request(
        &mut client,
        r#"["3","1","room:lobby","say",{"message":"Red fish"}]"#,
    )
    .await;
    assert_eq!(reply[4]["response"]["message"], "Blue fish");
}

/// Formatted pushes reach the connected client verbatim.
#[tokio::test]
async fn test_push_scenario() {
    let (server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();
    server.wait_for_connection().await.unwrap();

    let push =
        MockSocket::format_push_notification("room:lobby", "announce", &json!({"message": "hi"}))
            .unwrap();
    server.send_push_notification(&push).await.unwrap();

    let received: Value = serde_json::from_str(&client.recv().await.unwrap()).unwrap();
    assert_eq!(
        received,
        json!([null, null, "room:lobby", "announce", {"message": "hi"}])
    );
}

/// Heartbeats are acknowledged even with a non-empty payload.
#[tokio::test]
async fn test_heartbeat_ignores_payload() {
    let (_server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();

    let reply = request(
        &mut client,
        r#"["9",null,"phoenix","heartbeat",{"message":"One fish"}]"#,
    )
    .await;
    assert_eq!(reply[3], "phx_reply");
    assert_eq!(reply[4], json!({"response": {}, "status": "ok"}));
}

/// Default handler answers application events with a generic ack.
#[tokio::test]
async fn test_default_handler() {
    let transport = MemoryTransport::new();
    let server = MockSocket::new();
    server.initialise(&transport, URL).unwrap();

    let mut client = transport.connect(URL).await.unwrap();
    let reply = request(&mut client, r#"["4","1","room:lobby","custom",{"a":1}]"#).await;

    assert_eq!(
        reply,
        json!(["4", "1", "room:lobby", "custom", {"response": {}, "status": "ok"}])
    );
}

/// Replies echo message ref, join ref and topic for every event kind.
#[tokio::test]
async fn test_references_are_echoed() {
    let (_server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();

    let inbound = [
        Frame::new(Some("a1".into()), Some("j1".into()), "room:1", "phx_join", json!({})),
        Frame::new(Some("a2".into()), None, "phoenix", "heartbeat", json!({})),
        Frame::new(Some("a3".into()), Some("j1".into()), "room:1", "say", json!({})),
        Frame::new(None, None, "room:2", "say", json!({"message": "One fish"})),
    ];

    for frame in inbound {
        client.send_frame(&frame).await.unwrap();
        let reply = client.recv_frame().await.unwrap();

        assert_eq!(reply.message_ref, frame.message_ref);
        assert_eq!(reply.join_ref, frame.join_ref);
        assert_eq!(reply.topic, frame.topic);
    }
}

/// Integer references are echoed back as integers.
#[tokio::test]
async fn test_numeric_references_are_echoed() {
    let (_server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();

    let reply = request(&mut client, r#"[1,1,"room:lobby","phx_join",{}]"#).await;
    assert_eq!(
        reply,
        json!([1, 1, "room:lobby", "phx_reply", {"response": {}, "status": "ok"}])
    );

    let reply = request(
        &mut client,
        r#"[2,1,"room:lobby","say",{"message":"Red fish"}]"#,
    )
    .await;
    assert_eq!(
        reply,
        json!([2, 1, "room:lobby", "say", {"response": {"message": "Blue fish"}}])
    );

    client
        .send_frame(&Frame::new(
            Some(Reference::from(3u64)),
            None,
            "phoenix",
            "heartbeat",
            json!({}),
        ))
        .await
        .unwrap();
    let reply = client.recv_frame().await.unwrap();
    assert_eq!(reply.message_ref, Some(Reference::from(3u64)));
    assert!(reply.join_ref.is_none());
}

/// Two transports bound through one server keep their clients apart.
#[tokio::test]
async fn test_two_transports_share_one_server() {
    let server = MockSocket::new();
    let (a, b) = (MemoryTransport::new(), MemoryTransport::new());
    server.initialise_with(&a, URL, fish).unwrap();
    server.initialise_with(&b, URL, fish).unwrap();

    let mut on_a = a.connect(URL).await.unwrap();
    let _ = request(&mut on_a, r#"["1","1","room:lobby","phx_join",{}]"#).await;
    let mut on_b = b.connect(URL).await.unwrap();
    let _ = request(&mut on_b, r#"["1","1","room:lobby","phx_join",{}]"#).await;

    assert_ne!(on_a.id(), on_b.id());
    assert_eq!(server.connection_count().await, 2);

    let push = MockSocket::format_push_notification("room:lobby", "announce", &json!({})).unwrap();
    let delivered = server
        .send_push_notification_to(PushTarget::All, &push)
        .await
        .unwrap();
    assert_eq!(delivered, 2);
    assert_eq!(on_a.recv().await.as_deref(), Some(push.as_str()));
    assert_eq!(on_b.recv().await.as_deref(), Some(push.as_str()));

    let a_id = on_a.id();
    drop(on_b);
    while server.connection_count().await != 1 {
        tokio::task::yield_now().await;
    }
    assert_eq!(server.active_connection(), Some(a_id));

    server.send_push_notification(&push).await.unwrap();
    assert_eq!(on_a.recv().await.as_deref(), Some(push.as_str()));
}

/// Pushes can carry the join reference of the client's channel.
#[tokio::test]
async fn test_push_with_join_ref() {
    let (server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();
    let join = request(&mut client, r#"["1","j7","room:lobby","phx_join",{}]"#).await;

    let push = MockSocket::format_push_notification_with_join_ref(
        join[1].as_str().unwrap(),
        "room:lobby",
        "announce",
        &json!({"message": "hi"}),
    )
    .unwrap();
    server.send_push_notification(&push).await.unwrap();

    let frame = client.recv_frame().await.unwrap();
    assert!(frame.is_push());
    assert_eq!(frame.join_ref, Some(Reference::from("j7")));
    assert_eq!(frame.payload, json!({"message": "hi"}));
}

/// A second initialise on the same URL is swallowed and the first handler keeps serving.
#[tokio::test]
async fn test_reinitialise_same_url() {
    let (server, transport) = start(fish);

    server
        .initialise_with(&transport, URL, |_: &str, _: &str, _: &Value| json!("second"))
        .unwrap();

    // A separate server instance hitting the same URL is also fine.
    let other = MockSocket::new();
    other.initialise(&transport, URL).unwrap();

    let mut client = transport.connect(URL).await.unwrap();
    let reply = request(
        &mut client,
        r#"["2","1","room:lobby","say",{"message":"One fish"}]"#,
    )
    .await;
    assert_eq!(reply[4]["response"]["message"], "Two fish");
}

/// Bind failures other than address-in-use reach the caller.
#[tokio::test]
async fn test_invalid_url_is_fatal() {
    let transport = MemoryTransport::new();
    let server = MockSocket::new();

    match server.initialise(&transport, "localhost:4000") {
        Err(MockSocketError::Bind(BindError::InvalidUrl(url))) => assert_eq!(url, "localhost:4000"),
        other => panic!("expected InvalidUrl, got {other:?}"),
    }
}

/// Address-in-use from a listener bound outside the mock is swallowed too.
#[tokio::test]
async fn test_url_bound_elsewhere() {
    let transport = MemoryTransport::new();
    let _listener = transport.bind(URL).unwrap();

    let server = MockSocket::new();
    assert!(server.initialise(&transport, URL).is_ok());
}

/// Malformed frames are dropped and the connection keeps working.
#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let (_server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();

    client.send("not json").await.unwrap();
    client.send(r#"{"topic":"room:lobby"}"#).await.unwrap();
    client.send(r#"["1","1","room:lobby"]"#).await.unwrap();

    let reply = request(&mut client, r#"["5","1","room:lobby","phx_join",{}]"#).await;
    assert_eq!(reply[0], "5");
}

/// Pushes before any client connects are an explicit error.
#[tokio::test]
async fn test_push_before_connection() {
    let (server, _transport) = start(fish);
    let push = MockSocket::format_push_notification("room:lobby", "announce", &json!({})).unwrap();

    assert!(matches!(
        server.send_push_notification(&push).await,
        Err(MockSocketError::NoActiveConnection)
    ));
}

/// The newest connection is the active one; pushes can also be routed explicitly.
#[tokio::test]
async fn test_push_routing_with_multiple_clients() {
    let (server, transport) = start(fish);

    let mut first = transport.connect(URL).await.unwrap();
    let _ = request(&mut first, r#"["1","1","room:lobby","phx_join",{}]"#).await;
    let mut second = transport.connect(URL).await.unwrap();
    let _ = request(&mut second, r#"["1","1","room:lobby","phx_join",{}]"#).await;

    assert_eq!(server.connection_count().await, 2);
    assert_eq!(server.active_connection(), Some(second.id()));

    let push = MockSocket::format_push_notification("room:lobby", "announce", &json!({})).unwrap();

    server.send_push_notification(&push).await.unwrap();
    assert_eq!(second.recv().await.as_deref(), Some(push.as_str()));
    assert!(first.try_recv().is_none());

    let delivered = server
        .send_push_notification_to(PushTarget::Connection(first.id()), &push)
        .await
        .unwrap();
    assert_eq!(delivered, 1);
    assert_eq!(first.recv().await.as_deref(), Some(push.as_str()));

    let delivered = server
        .send_push_notification_to(PushTarget::All, &push)
        .await
        .unwrap();
    assert_eq!(delivered, 2);
    assert_eq!(first.recv().await.as_deref(), Some(push.as_str()));
    assert_eq!(second.recv().await.as_deref(), Some(push.as_str()));
}

/// When the active client disconnects the previous one becomes active again.
#[tokio::test]
async fn test_active_connection_falls_back_on_close() {
    let (server, transport) = start(fish);

    let mut first = transport.connect(URL).await.unwrap();
    let _ = request(&mut first, r#"["1","1","room:lobby","phx_join",{}]"#).await;
    let mut second = transport.connect(URL).await.unwrap();
    let _ = request(&mut second, r#"["1","1","room:lobby","phx_join",{}]"#).await;

    let first_id = first.id();
    second.close();

    // The close is processed by the connection task; wait for it.
    while server.connection_count().await != 1 {
        tokio::task::yield_now().await;
    }
    assert_eq!(server.active_connection(), Some(first_id));

    server.push("room:lobby", "announce", &json!({"n": 1})).await.unwrap();
    let frame = first.recv_frame().await.unwrap();
    assert!(frame.is_push());
    assert_eq!(frame.payload, json!({"n": 1}));
}

/// Frames on one connection are answered in order.
#[tokio::test]
async fn test_replies_preserve_order() {
    let (_server, transport) = start(fish);
    let mut client = transport.connect(URL).await.unwrap();

    for i in 0..20 {
        let frame = Frame::new(
            Some(i.to_string().into()),
            Some("1".into()),
            "room:lobby",
            "say",
            json!({}),
        );
        client.send_frame(&frame).await.unwrap();
    }

    for i in 0..20 {
        let reply = client.recv_frame().await.unwrap();
        assert_eq!(reply.message_ref, Some(i.to_string().into()));
        assert_eq!(reply.payload["response"]["message"], "Unknown fish");
    }
}

/// Pushes can be formatted before the server exists and decode to the push shape.
#[test]
fn test_push_framing() {
    let payload = json!({"message": "hi", "tags": ["a", "b"]});
    let push = MockSocket::format_push_notification("room:7", "announce", &payload).unwrap();

    assert_eq!(
        JsonCodec::decode(push).unwrap(),
        Frame::push("room:7", "announce", payload)
    );
}
