//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the persistence and identity ports.
//! Used when no `DATABASE_URL` is configured, and by the test suites.

use async_trait::async_trait;
use chrono::Utc;
use matching_core::domain::{Interaction, InteractionKind, User};
use matching_core::ports::{DatabaseService, IdentityService, PortError, PortResult};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    tokens: HashMap<String, String>,
    likes: Vec<Interaction>,
    dislikes: Vec<Interaction>,
}

impl MemoryState {
    fn edges(&self, kind: InteractionKind) -> &Vec<Interaction> {
        match kind {
            InteractionKind::Like => &self.likes,
            InteractionKind::Dislike => &self.dislikes,
        }
    }

    fn edges_mut(&mut self, kind: InteractionKind) -> &mut Vec<Interaction> {
        match kind {
            InteractionKind::Like => &mut self.likes,
            InteractionKind::Dislike => &mut self.dislikes,
        }
    }

    /// Both endpoints must be known users, like the foreign keys in Postgres.
    fn insert_edge(
        &mut self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> PortResult<Interaction> {
        for user_id in [actor_id, target_id] {
            if !self.users.contains_key(&user_id) {
                return Err(PortError::NotFound(format!("User {} not found", user_id)));
            }
        }
        let edge = Interaction {
            id: Uuid::new_v4(),
            kind,
            actor_id,
            target_id,
            created_at: Utc::now(),
        };
        self.edges_mut(kind).push(edge.clone());
        Ok(edge)
    }
}

/// Every operation takes the single lock, so each call is atomic.
#[derive(Default)]
pub struct InMemoryDatabase {
    state: Mutex<MemoryState>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user record.
    pub async fn insert_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    /// Registers a bearer token for `email`.
    pub async fn issue_token(&self, token: impl Into<String>, email: impl Into<String>) {
        self.state
            .lock()
            .await
            .tokens
            .insert(token.into(), email.into());
    }

    pub async fn revoke_token(&self, token: &str) {
        self.state.lock().await.tokens.remove(token);
    }

    /// Number of stored edges of `kind`.
    pub async fn count(&self, kind: InteractionKind) -> usize {
        self.state.lock().await.edges(kind).len()
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.state
            .lock()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        self.state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn list_users_except(&self, user_id: Uuid) -> PortResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.id != user_id)
            .cloned()
            .collect())
    }

    async fn create_interaction(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> PortResult<Interaction> {
        let mut state = self.state.lock().await;
        state.insert_edge(kind, actor_id, target_id)
    }

    async fn create_unique_interaction(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> PortResult<Interaction> {
        let mut state = self.state.lock().await;
        let exists = state
            .edges(kind)
            .iter()
            .any(|e| e.actor_id == actor_id && e.target_id == target_id);
        if exists {
            return Err(PortError::Conflict(format!(
                "user {} already has a {} for user {}",
                actor_id, kind, target_id
            )));
        }
        state.insert_edge(kind, actor_id, target_id)
    }

    async fn get_interaction(&self, kind: InteractionKind, id: Uuid) -> PortResult<Interaction> {
        self.state
            .lock()
            .await
            .edges(kind)
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("{} {} not found", kind, id)))
    }

    async fn delete_interaction(&self, kind: InteractionKind, id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let edges = state.edges_mut(kind);
        let before = edges.len();
        edges.retain(|e| e.id != id);
        if edges.len() == before {
            return Err(PortError::NotFound(format!("{} {} not found", kind, id)));
        }
        Ok(())
    }

    async fn list_interactions_by_actor(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
    ) -> PortResult<Vec<Interaction>> {
        let state = self.state.lock().await;
        // Insertion order is creation order, so reversing gives newest first.
        Ok(state
            .edges(kind)
            .iter()
            .rev()
            .filter(|e| e.actor_id == actor_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IdentityService for InMemoryDatabase {
    async fn resolve_identity(&self, token: &str) -> PortResult<String> {
        self.state
            .lock()
            .await
            .tokens
            .get(token)
            .cloned()
            .ok_or(PortError::Unauthorized)
    }
}
