//! The live channel driven over a real socket.

mod common;

use api_lib::adapters::InMemoryDatabase;
use api_lib::web::{router, state::AppState};
use common::{live_state, seed, user_at};
use futures::{SinkExt, StreamExt};
use matching_core::User;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    addr: SocketAddr,
    state: Arc<AppState>,
    alice: User,
    bob: User,
}

async fn serve() -> Harness {
    let db = Arc::new(InMemoryDatabase::new());
    let (alice, bob) = (user_at("alice", 0.0, 0.0), user_at("bob", 0.0, 0.01));
    seed(&db, &alice).await;
    seed(&db, &bob).await;
    let state = Arc::new(live_state(db));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Harness {
        addr,
        state,
        alice,
        bob,
    }
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    client
}

async fn send_handshake(client: &mut Client, token: &str) {
    let frame = json!({ "type": "handshake", "token": token }).to_string();
    client.send(Message::text(frame)).await.unwrap();
}

/// Next frame from the server, skipping ping/pong.
async fn next_frame(client: &mut Client) -> Option<Message> {
    tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(message)) => return Some(message),
                Some(Err(_)) | None => return None,
            }
        }
    })
    .await
    .expect("timed out waiting for a frame")
}

async fn next_json(client: &mut Client) -> Value {
    match next_frame(client).await {
        Some(Message::Text(text)) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

async fn expect_closed(client: &mut Client) {
    match next_frame(client).await {
        Some(Message::Close(_)) | None => {}
        other => panic!("expected the socket to close, got {other:?}"),
    }
}

/// Polls the registry until `user_id` is bound (or unbound).
async fn wait_for_binding(state: &AppState, user_id: Uuid, bound: bool) {
    tokio::time::timeout(WAIT, async {
        while state.registry.lookup(user_id).await.is_some() != bound {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("registry never reached the expected state");
}

#[tokio::test]
async fn a_bad_token_gets_an_error_frame_then_close() {
    let h = serve().await;
    let mut client = connect(h.addr).await;

    send_handshake(&mut client, "token-nobody").await;

    assert_eq!(
        next_json(&mut client).await,
        json!({ "type": "error", "message": "Unauthorized." })
    );
    expect_closed(&mut client).await;
    assert!(h.state.registry.is_empty().await);
}

#[tokio::test]
async fn a_non_handshake_first_message_is_rejected() {
    let h = serve().await;
    let mut client = connect(h.addr).await;

    client.send(Message::text("hello")).await.unwrap();

    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "First message must be a handshake.");
    expect_closed(&mut client).await;
}

#[tokio::test]
async fn a_like_arrives_over_the_wire() {
    let h = serve().await;
    let mut bob = connect(h.addr).await;
    // Control frames before the handshake are not the handshake.
    bob.send(Message::Ping(Default::default())).await.unwrap();
    send_handshake(&mut bob, "token-bob").await;
    wait_for_binding(&h.state, h.bob.id, true).await;

    let target = h.bob.id.to_string();
    h.state
        .gateway
        .like(h.alice.id, Some(target.as_str()))
        .await
        .unwrap();

    assert_eq!(
        next_json(&mut bob).await,
        json!({ "type": "notification", "data": { "userId": h.alice.id.to_string() } })
    );
}

#[tokio::test]
async fn closing_the_socket_unbinds_the_user() {
    let h = serve().await;
    let mut bob = connect(h.addr).await;
    send_handshake(&mut bob, "token-bob").await;
    wait_for_binding(&h.state, h.bob.id, true).await;

    bob.close(None).await.unwrap();

    wait_for_binding(&h.state, h.bob.id, false).await;
    assert!(h.state.registry.is_empty().await);
}

#[tokio::test]
async fn a_newer_handshake_evicts_and_closes_the_older_socket() {
    let h = serve().await;
    let mut first = connect(h.addr).await;
    send_handshake(&mut first, "token-bob").await;
    wait_for_binding(&h.state, h.bob.id, true).await;

    let mut second = connect(h.addr).await;
    send_handshake(&mut second, "token-bob").await;

    // The evicted socket is closed by the server once the new one binds.
    expect_closed(&mut first).await;
    assert_eq!(h.state.registry.len().await, 1);

    let target = h.bob.id.to_string();
    h.state
        .gateway
        .like(h.alice.id, Some(target.as_str()))
        .await
        .unwrap();

    let pushed = next_json(&mut second).await;
    assert_eq!(pushed["data"]["userId"], h.alice.id.to_string());
    // The old connection's cleanup left the new binding in place.
    assert!(h.state.registry.lookup(h.bob.id).await.is_some());
}
