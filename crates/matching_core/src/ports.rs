//! crates/matching_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or sockets.

use crate::domain::{Interaction, InteractionKind, User};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port and core service.
///
/// Adapters must translate their own failures into one of these kinds before
/// returning, so nothing storage-specific crosses into the core.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users (read-only) ---
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    /// Every user except `user_id`. Exclusion is by identity, not position.
    async fn list_users_except(&self, user_id: Uuid) -> PortResult<Vec<User>>;

    // --- Like / Dislike edges ---
    /// Stores a new edge. `NotFound` when either user does not exist.
    async fn create_interaction(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> PortResult<Interaction>;

    /// Like [`DatabaseService::create_interaction`], but returns `Conflict`
    /// when `actor_id` already has an edge of `kind` to `target_id`. The check
    /// and the insert are atomic.
    async fn create_unique_interaction(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> PortResult<Interaction>;

    async fn get_interaction(&self, kind: InteractionKind, id: Uuid) -> PortResult<Interaction>;

    /// Removes an edge. Returns `NotFound` when no row was deleted.
    async fn delete_interaction(&self, kind: InteractionKind, id: Uuid) -> PortResult<()>;

    /// Newest first.
    async fn list_interactions_by_actor(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
    ) -> PortResult<Vec<Interaction>>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolves a bearer token to the email of the account it was issued for.
    async fn resolve_identity(&self, token: &str) -> PortResult<String>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Tells `target_id` that `actor_id` liked them, if they are listening.
    ///
    /// Best-effort: there is no result to inspect and nothing is retried.
    async fn notify_liked(&self, target_id: Uuid, actor_id: Uuid);
}
