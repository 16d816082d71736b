//! crates/matching_core/src/identity.rs
//!
//! Turns a bearer token into the user it belongs to.

use crate::domain::User;
use crate::ports::{DatabaseService, IdentityService, PortError, PortResult};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct IdentityResolver {
    identity: Arc<dyn IdentityService>,
    db: Arc<dyn DatabaseService>,
}

impl IdentityResolver {
    pub fn new(identity: Arc<dyn IdentityService>, db: Arc<dyn DatabaseService>) -> Self {
        Self { identity, db }
    }

    /// Resolves `token` to its email, then the email to a user.
    ///
    /// Every failure along the way is reported as `Unauthorized`.
    pub async fn authenticate(&self, token: &str) -> PortResult<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PortError::Unauthorized);
        }

        let email = self.identity.resolve_identity(token).await.map_err(|e| {
            debug!("Token rejected: {e}");
            PortError::Unauthorized
        })?;

        self.db.get_user_by_email(&email).await.map_err(|e| {
            debug!("No user for authenticated email {email}: {e}");
            PortError::Unauthorized
        })
    }
}
