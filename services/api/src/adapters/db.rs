//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` and `IdentityService` ports from the core crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matching_core::domain::{GeoPoint, Interaction, InteractionKind, User};
use matching_core::ports::{DatabaseService, IdentityService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Postgres error code for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres error code for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence and identity ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn table(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::Like => "likes",
        InteractionKind::Dislike => "dislikes",
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Internal(e.to_string())
}

/// Maps constraint violations on an edge insert to their port meaning.
fn write_error(e: sqlx::Error, kind: InteractionKind, actor_id: Uuid, target_id: Uuid) -> PortError {
    let code = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());
    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => PortError::Conflict(format!(
            "user {actor_id} already has a {kind} for user {target_id}"
        )),
        Some(FOREIGN_KEY_VIOLATION) => PortError::NotFound(format!(
            "user {actor_id} or {target_id} not found"
        )),
        _ => unexpected(e),
    }
}

fn insert_sql(kind: InteractionKind) -> String {
    format!(
        "INSERT INTO {} (id, actor_id, target_id) VALUES ($1, $2, $3) \
         RETURNING id, actor_id, target_id, created_at",
        table(kind)
    )
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    latitude: f64,
    longitude: f64,
    images: Vec<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            position: GeoPoint::new(self.latitude, self.longitude),
            images: self.images,
        }
    }
}

#[derive(FromRow)]
struct InteractionRecord {
    id: Uuid,
    actor_id: Uuid,
    target_id: Uuid,
    created_at: DateTime<Utc>,
}
impl InteractionRecord {
    fn to_domain(self, kind: InteractionKind) -> Interaction {
        Interaction {
            id: self.id,
            kind,
            actor_id: self.actor_id,
            target_id: self.target_id,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, latitude, longitude, images";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User with email {} not found", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_users_except(&self, user_id: Uuid) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id <> $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_interaction(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> PortResult<Interaction> {
        let record = sqlx::query_as::<_, InteractionRecord>(&insert_sql(kind))
            .bind(Uuid::new_v4())
            .bind(actor_id)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, kind, actor_id, target_id))?;
        Ok(record.to_domain(kind))
    }

    /// Serializes writers of the same (kind, actor, target) triple with a
    /// transaction-scoped advisory lock, so the existence check and the insert
    /// cannot interleave. `likes` has no unique index to fall back on.
    async fn create_unique_interaction(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> PortResult<Interaction> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(format!("{}:{}:{}", table(kind), actor_id, target_id))
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let existing: Option<Uuid> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE actor_id = $1 AND target_id = $2 LIMIT 1",
            table(kind)
        ))
        .bind(actor_id)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?;
        if existing.is_some() {
            return Err(PortError::Conflict(format!(
                "user {actor_id} already has a {kind} for user {target_id}"
            )));
        }

        let record = sqlx::query_as::<_, InteractionRecord>(&insert_sql(kind))
            .bind(Uuid::new_v4())
            .bind(actor_id)
            .bind(target_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| write_error(e, kind, actor_id, target_id))?;
        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain(kind))
    }

    async fn get_interaction(&self, kind: InteractionKind, id: Uuid) -> PortResult<Interaction> {
        let record = sqlx::query_as::<_, InteractionRecord>(&format!(
            "SELECT id, actor_id, target_id, created_at FROM {} WHERE id = $1",
            table(kind)
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("{} {} not found", kind, id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain(kind))
    }

    async fn delete_interaction(&self, kind: InteractionKind, id: Uuid) -> PortResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table(kind)))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("{} {} not found", kind, id)));
        }
        Ok(())
    }

    async fn list_interactions_by_actor(
        &self,
        kind: InteractionKind,
        actor_id: Uuid,
    ) -> PortResult<Vec<Interaction>> {
        let records = sqlx::query_as::<_, InteractionRecord>(&format!(
            "SELECT id, actor_id, target_id, created_at FROM {} \
             WHERE actor_id = $1 ORDER BY created_at DESC",
            table(kind)
        ))
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain(kind)).collect())
    }
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for DbAdapter {
    async fn resolve_identity(&self, token: &str) -> PortResult<String> {
        let email: Option<String> = sqlx::query_scalar(
            "SELECT email FROM auth_sessions WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        email.ok_or(PortError::Unauthorized)
    }
}
