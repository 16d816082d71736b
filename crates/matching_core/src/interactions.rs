//! crates/matching_core/src/interactions.rs
//!
//! The like/dislike edge store. Validates identifiers, enforces the
//! duplicate rules and normalizes every persistence failure into a
//! [`PortError`] kind before it leaves this module.

use crate::domain::{Interaction, InteractionKind, LikeDuplicatePolicy};
use crate::ports::{DatabaseService, PortError, PortResult};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Parses an identifier received from a client.
///
/// Missing, blank, nil and malformed values are all `InvalidInput`.
pub fn parse_id(raw: Option<&str>, field: &str) -> PortResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PortError::InvalidInput(format!("{field} is required")))?;
    let id = Uuid::parse_str(raw)
        .map_err(|_| PortError::InvalidInput(format!("{field} is not a valid id")))?;
    require_id(id, field)
}

fn require_id(id: Uuid, field: &str) -> PortResult<Uuid> {
    if id.is_nil() {
        return Err(PortError::InvalidInput(format!("{field} is required")));
    }
    Ok(id)
}

#[derive(Clone)]
pub struct InteractionStore {
    db: Arc<dyn DatabaseService>,
    like_policy: LikeDuplicatePolicy,
}

impl InteractionStore {
    pub fn new(db: Arc<dyn DatabaseService>, like_policy: LikeDuplicatePolicy) -> Self {
        Self { db, like_policy }
    }

    pub fn like_policy(&self) -> LikeDuplicatePolicy {
        self.like_policy
    }

    /// Records that `actor_id` likes `target_id`.
    ///
    /// Under [`LikeDuplicatePolicy::Allow`] every call writes a new edge.
    pub async fn create_like(&self, actor_id: Uuid, target_id: Uuid) -> PortResult<Interaction> {
        let unique = self.like_policy == LikeDuplicatePolicy::Reject;
        self.create(InteractionKind::Like, actor_id, target_id, unique)
            .await
    }

    /// Records that `actor_id` dislikes `target_id`. A second dislike of the
    /// same target is a `Conflict` and writes nothing.
    pub async fn create_dislike(&self, actor_id: Uuid, target_id: Uuid) -> PortResult<Interaction> {
        self.create(InteractionKind::Dislike, actor_id, target_id, true)
            .await
    }

    pub async fn delete_like(&self, actor_id: Uuid, like_id: Uuid) -> PortResult<()> {
        self.delete(InteractionKind::Like, actor_id, like_id).await
    }

    pub async fn delete_dislike(&self, actor_id: Uuid, dislike_id: Uuid) -> PortResult<()> {
        self.delete(InteractionKind::Dislike, actor_id, dislike_id)
            .await
    }

    pub async fn list_likes(&self, actor_id: Uuid) -> PortResult<Vec<Interaction>> {
        self.list(InteractionKind::Like, actor_id).await
    }

    pub async fn list_dislikes(&self, actor_id: Uuid) -> PortResult<Vec<Interaction>> {
        self.list(InteractionKind::Dislike, actor_id).await
    }

    /// The target must exist; an edge to an unknown user is `NotFound`, never
    /// a retryable storage failure.
    async fn create(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
        unique: bool,
    ) -> PortResult<Interaction> {
        let actor_id = require_id(actor_id, "actor id")?;
        let target_id = require_id(target_id, "target id")?;
        let unknown_target = || PortError::NotFound(format!("user {target_id} not found"));

        match self.db.get_user_by_id(target_id).await {
            Ok(_) => {}
            Err(PortError::NotFound(_)) => return Err(unknown_target()),
            Err(e) => return Err(into_internal(e)),
        }

        let written = if unique {
            self.db
                .create_unique_interaction(kind, actor_id, target_id)
                .await
        } else {
            self.db.create_interaction(kind, actor_id, target_id).await
        };
        let edge = match written {
            Ok(edge) => edge,
            Err(PortError::Conflict(_)) => {
                debug!(%actor_id, %target_id, "Duplicate {kind} rejected");
                return Err(PortError::Conflict(format!(
                    "user {actor_id} already has a {kind} for user {target_id}"
                )));
            }
            // A user removed between the lookup and the insert.
            Err(PortError::NotFound(_)) => return Err(unknown_target()),
            Err(e) => return Err(into_internal(e)),
        };
        info!(id = %edge.id, %actor_id, %target_id, "Created {kind}");
        Ok(edge)
    }

    /// Existence is checked first so "already gone" is reported as `NotFound`
    /// rather than as a storage failure. Edges owned by someone else look
    /// exactly like missing ones.
    async fn delete(&self, kind: InteractionKind, actor_id: Uuid, id: Uuid) -> PortResult<()> {
        let id = require_id(id, "id")?;
        let not_found = || PortError::NotFound(format!("{kind} {id} not found"));

        let edge = match self.db.get_interaction(kind, id).await {
            Ok(edge) => edge,
            Err(PortError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(into_internal(e)),
        };
        if edge.actor_id != actor_id {
            return Err(not_found());
        }

        match self.db.delete_interaction(kind, id).await {
            Ok(()) => {
                info!(%id, %actor_id, "Deleted {kind}");
                Ok(())
            }
            // Lost a race with a concurrent delete.
            Err(PortError::NotFound(_)) => Err(not_found()),
            Err(e) => Err(into_internal(e)),
        }
    }

    async fn list(&self, kind: InteractionKind, actor_id: Uuid) -> PortResult<Vec<Interaction>> {
        let actor_id = require_id(actor_id, "actor id")?;
        self.db
            .list_interactions_by_actor(kind, actor_id)
            .await
            .map_err(into_internal)
    }
}

/// Anything the caller did not already handle is a storage fault from the
/// caller's point of view.
fn into_internal(error: PortError) -> PortError {
    match error {
        PortError::Internal(_) => error,
        other => PortError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_a_uuid() {
        let id = Uuid::new_v4();
        let plain = id.to_string();
        let padded = format!("  {id} ");
        assert_eq!(parse_id(Some(plain.as_str()), "userId"), Ok(id));
        assert_eq!(parse_id(Some(padded.as_str()), "userId"), Ok(id));
    }

    #[test]
    fn parse_id_rejects_missing_and_malformed_values() {
        for raw in [None, Some(""), Some("   "), Some("not-a-uuid")] {
            assert!(
                matches!(parse_id(raw, "userId"), Err(PortError::InvalidInput(_))),
                "{raw:?} should be rejected"
            );
        }
        let nil = Uuid::nil().to_string();
        assert!(matches!(
            parse_id(Some(nil.as_str()), "userId"),
            Err(PortError::InvalidInput(_))
        ));
    }

    #[test]
    fn storage_errors_are_normalized_to_internal() {
        assert_eq!(
            into_internal(PortError::NotFound("row".into())),
            PortError::Internal("Item not found: row".into())
        );
        assert_eq!(
            into_internal(PortError::Internal("boom".into())),
            PortError::Internal("boom".into())
        );
        assert_eq!(
            into_internal(PortError::Conflict("dup".into())),
            PortError::Internal("Conflict: dup".into())
        );
    }
}
