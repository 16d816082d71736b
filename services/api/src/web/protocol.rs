//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the client and the API server
//! for live "you were liked" notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Binds the connection to the token's user. This must be the first message
    /// sent on the connection.
    Handshake { token: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Someone liked the connected user.
    Notification { data: NotificationData },

    /// Reports a fatal error; the server closes the connection right after.
    Error { message: String },
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// The user who performed the like.
    pub user_id: Uuid,
}

impl ServerMessage {
    pub fn liked_by(actor_id: Uuid) -> Self {
        ServerMessage::Notification {
            data: NotificationData { user_id: actor_id },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
