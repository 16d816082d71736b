//! services/api/src/push/dispatcher.rs
//!
//! Delivers "you were liked" events to whoever is currently connected.

use crate::push::registry::ConnectionRegistry;
use crate::web::protocol::ServerMessage;
use async_trait::async_trait;
use matching_core::ports::NotificationService;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

/// The [`NotificationService`] backed by the [`ConnectionRegistry`].
///
/// Pushing is a non-blocking enqueue onto the recipient's bounded queue, so
/// a stalled client can never hold up the request that triggered the event.
#[derive(Clone)]
pub struct PushDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl PushDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl NotificationService for PushDispatcher {
    async fn notify_liked(&self, target_id: Uuid, actor_id: Uuid) {
        let Some(connection) = self.registry.lookup(target_id).await else {
            debug!(%target_id, %actor_id, "Like notification skipped; recipient offline");
            return;
        };

        match connection.try_push(ServerMessage::liked_by(actor_id)) {
            Ok(()) => debug!(
                %target_id,
                %actor_id,
                connection_id = %connection.id(),
                "Like notification queued"
            ),
            Err(TrySendError::Full(_)) => warn!(
                %target_id,
                connection_id = %connection.id(),
                "Like notification dropped; recipient queue is full"
            ),
            Err(TrySendError::Closed(_)) => debug!(
                %target_id,
                connection_id = %connection.id(),
                "Like notification dropped; connection already closed"
            ),
        }
    }
}
