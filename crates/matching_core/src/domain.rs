//! crates/matching_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A geographic position in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Represents a registered user. Owned by the account subsystem; read-only here.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub position: GeoPoint,
    pub images: Vec<String>,
}

/// The two kinds of directed edge a user can draw to another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Like,
    Dislike,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Dislike => "dislike",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A like or dislike edge from `actor_id` to `target_id`.
///
/// Edges are created and deleted, never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: Uuid,
    pub kind: InteractionKind,
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// A candidate returned by the proximity search, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyUser {
    pub user: User,
    pub distance_km: f64,
}

/// Controls whether repeated likes on the same target are accepted.
///
/// `Allow` keeps every like as a separate edge. `Reject` applies the same
/// duplicate check dislikes always get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikeDuplicatePolicy {
    #[default]
    Allow,
    Reject,
}
