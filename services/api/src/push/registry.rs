//! services/api/src/push/registry.rs
//!
//! The process-wide table of live push connections, at most one per user.

use crate::web::protocol::ServerMessage;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// The sending half of one live connection's outbound queue.
///
/// Each accepted WebSocket gets a fresh `id`, which is what lets a closing
/// connection tell whether it is still the registered one.
#[derive(Clone, Debug)]
pub struct LiveConnection {
    id: Uuid,
    sender: mpsc::Sender<ServerMessage>,
}

impl LiveConnection {
    pub fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    /// Creates a connection together with the queue its writer drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self::new(sender), receiver)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queues `message` without waiting. Fails if the queue is full or the
    /// writer has gone away.
    pub fn try_push(
        &self,
        message: ServerMessage,
    ) -> Result<(), mpsc::error::TrySendError<ServerMessage>> {
        self.sender.try_send(message)
    }
}

/// Maps a user id to that user's current [`LiveConnection`].
///
/// All access goes through one `RwLock`, so bind, unbind and lookup on the
/// same user are linearizable. The registry never performs network I/O.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, LiveConnection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `connection` for `user_id`, returning the binding it replaced.
    ///
    /// The replaced connection is only forgotten here. Once the caller drops
    /// the returned value its queue closes and its writer shuts down.
    pub async fn bind(&self, user_id: Uuid, connection: LiveConnection) -> Option<LiveConnection> {
        let connection_id = connection.id;
        let previous = self.connections.write().await.insert(user_id, connection);
        match &previous {
            Some(old) => info!(
                %user_id,
                %connection_id,
                evicted = %old.id,
                "Live connection replaced an older one"
            ),
            None => info!(%user_id, %connection_id, "Live connection bound"),
        }
        previous
    }

    /// Removes the binding for `user_id` only if it still belongs to
    /// `connection_id`. Returns whether anything was removed.
    pub async fn unbind(&self, user_id: Uuid, connection_id: Uuid) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(&user_id) {
            Some(current) if current.id == connection_id => {
                connections.remove(&user_id);
                info!(%user_id, %connection_id, "Live connection unbound");
                true
            }
            Some(current) => {
                debug!(
                    %user_id,
                    %connection_id,
                    current = %current.id,
                    "Stale unbind ignored; a newer connection is registered"
                );
                false
            }
            None => false,
        }
    }

    pub async fn lookup(&self, user_id: Uuid) -> Option<LiveConnection> {
        self.connections.read().await.get(&user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
