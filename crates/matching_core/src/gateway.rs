//! crates/matching_core/src/gateway.rs
//!
//! Orchestrates interaction requests: write the edge first, then hand the
//! "you were liked" event to the notifier.

use crate::domain::Interaction;
use crate::interactions::{parse_id, InteractionStore};
use crate::ports::{NotificationService, PortResult};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct InteractionGateway {
    store: InteractionStore,
    notifier: Arc<dyn NotificationService>,
}

impl InteractionGateway {
    pub fn new(store: InteractionStore, notifier: Arc<dyn NotificationService>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &InteractionStore {
        &self.store
    }

    /// Creates a like and notifies the target.
    ///
    /// The notification is only attempted once the edge is stored, and its
    /// outcome never changes the result returned here.
    pub async fn like(&self, actor_id: Uuid, target_id: Option<&str>) -> PortResult<Interaction> {
        let target_id = parse_id(target_id, "userId")?;
        let edge = self.store.create_like(actor_id, target_id).await?;

        debug!(like_id = %edge.id, %target_id, "Dispatching like notification");
        self.notifier.notify_liked(edge.target_id, edge.actor_id).await;
        Ok(edge)
    }

    pub async fn dislike(
        &self,
        actor_id: Uuid,
        target_id: Option<&str>,
    ) -> PortResult<Interaction> {
        let target_id = parse_id(target_id, "userId")?;
        self.store.create_dislike(actor_id, target_id).await
    }

    pub async fn remove_like(&self, actor_id: Uuid, like_id: Option<&str>) -> PortResult<()> {
        let like_id = parse_id(like_id, "likeId")?;
        self.store.delete_like(actor_id, like_id).await
    }

    pub async fn remove_dislike(&self, actor_id: Uuid, dislike_id: Option<&str>) -> PortResult<()> {
        let dislike_id = parse_id(dislike_id, "dislikeId")?;
        self.store.delete_dislike(actor_id, dislike_id).await
    }

    pub async fn likes_of(&self, actor_id: Uuid) -> PortResult<Vec<Interaction>> {
        self.store.list_likes(actor_id).await
    }

    pub async fn dislikes_of(&self, actor_id: Uuid) -> PortResult<Vec<Interaction>> {
        self.store.list_dislikes(actor_id).await
    }
}
