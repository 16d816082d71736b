//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a live notification
//! connection. It runs the handshake, binds the connection in the registry and
//! guarantees the matching unbind when the socket goes away.

use crate::{
    push::LiveConnection,
    web::{
        protocol::{ClientMessage, ServerMessage},
        state::AppState,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream, StreamExt},
    SinkExt,
};
use matching_core::User;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
///
/// Authentication happens inside the socket via the handshake message, so this
/// route is not behind the auth middleware.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // --- 1. Handshake Phase ---
    let user = match handshake(&app_state, &mut receiver).await {
        Ok(user) => user,
        Err(reason) => {
            warn!("WebSocket handshake failed: {}", reason);
            let _ = send_message(&mut sender, &ServerMessage::error(reason)).await;
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    let user_id = user.id;

    // --- 2. Bind ---
    let (connection, queue) = LiveConnection::channel(app_state.config.push_buffer);
    let connection_id = connection.id();
    // The evicted connection's queue closes once this value is dropped, which
    // shuts its writer down.
    drop(app_state.registry.bind(user_id, connection).await);
    info!(%user_id, %connection_id, "WebSocket connection established");

    let cancel = CancellationToken::new();
    let writer = tokio::spawn(write_loop(sender, queue, cancel.clone()));

    // --- 3. Main Message Loop ---
    // Nothing is expected from the client after the handshake; reading only
    // serves to notice when the socket closes.
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(%user_id, %connection_id, "Writer finished; closing reader");
                break;
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => {
                        info!(%user_id, %connection_id, "Client disconnected.");
                        break;
                    }
                    Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_))) => {
                        debug!(%user_id, "Ignoring client message after handshake");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%user_id, %connection_id, "WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    // --- 4. Cleanup ---
    app_state.registry.unbind(user_id, connection_id).await;
    cancel.cancel();
    if let Err(e) = writer.await {
        error!(%user_id, "WebSocket writer task failed: {:?}", e);
    }
    info!(%user_id, %connection_id, "WebSocket connection closed.");
}

/// Waits for the first text frame and authenticates it.
///
/// The error string is safe to show to the client.
async fn handshake(
    app_state: &AppState,
    receiver: &mut SplitStream<WebSocket>,
) -> Result<User, String> {
    // Control frames do not count as the first message.
    let first = async {
        loop {
            match receiver.next().await {
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => return other,
            }
        }
    };
    let first = tokio::time::timeout(app_state.config.handshake_timeout, first)
        .await
        .map_err(|_| "Handshake timed out.".to_string())?;

    let text = match first {
        Some(Ok(Message::Text(text))) => text,
        Some(Ok(_)) => return Err("First message must be a handshake.".to_string()),
        Some(Err(e)) => return Err(format!("Connection error: {}", e)),
        None => return Err("Client disconnected before the handshake.".to_string()),
    };

    let token = match serde_json::from_str::<ClientMessage>(text.as_str()) {
        Ok(ClientMessage::Handshake { token }) => token,
        Err(e) => {
            debug!("Malformed handshake: {}", e);
            return Err("First message must be a handshake.".to_string());
        }
    };

    app_state
        .identity
        .authenticate(&token)
        .await
        .map_err(|_| "Unauthorized.".to_string())
}

/// Drains the connection's queue into the socket. Ends when the queue closes
/// (the binding was replaced or the reader shut down) or the socket fails,
/// and cancels `cancel` on the way out so the reader stops too.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut queue: mpsc::Receiver<ServerMessage>,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = queue.recv() => {
                match message {
                    Some(message) => message,
                    None => break,
                }
            }
        };
        // A failed push is dropped; the connection is gone anyway.
        if let Err(e) = send_message(&mut sender, &message).await {
            debug!("Dropping push on dead socket: {}", e);
            break;
        }
    }
    let _ = sender.send(Message::Close(None)).await;
    cancel.cancel();
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}
