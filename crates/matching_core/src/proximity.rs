//! crates/matching_core/src/proximity.rs
//!
//! Finds the users located within a radius of a reference user.
//!
//! The search is a full scan over every other user. That is fine for the
//! small-to-moderate user counts this service targets; a larger deployment
//! would need a spatial index (geohash grid or R-tree) in the storage layer.

use crate::domain::{NearbyUser, User};
use crate::geo::distance_between;
use crate::ports::{DatabaseService, PortError, PortResult};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// The radius used when the caller does not ask for one.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

#[derive(Clone)]
pub struct ProximityFinder {
    db: Arc<dyn DatabaseService>,
    default_radius_km: f64,
}

impl ProximityFinder {
    pub fn new(db: Arc<dyn DatabaseService>, default_radius_km: f64) -> Self {
        Self {
            db,
            default_radius_km,
        }
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }

    /// Returns every other user strictly closer than `radius_km` (or the
    /// default radius) to `reference_id`, nearest first.
    pub async fn find_nearby(
        &self,
        reference_id: Uuid,
        radius_km: Option<f64>,
    ) -> PortResult<Vec<NearbyUser>> {
        let radius_km = radius_km.unwrap_or(self.default_radius_km);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(PortError::InvalidInput(format!(
                "radius must be a positive number of kilometres, got {radius_km}"
            )));
        }

        let reference = self.db.get_user_by_id(reference_id).await?;
        let candidates = self.db.list_users_except(reference_id).await?;
        let scanned = candidates.len();

        let nearby = filter_nearby(&reference, candidates, radius_km);
        debug!(
            user_id = %reference_id,
            radius_km,
            scanned,
            matched = nearby.len(),
            "Proximity search finished"
        );
        Ok(nearby)
    }
}

/// Keeps the candidates strictly inside `radius_km` of `reference`, sorted by
/// ascending distance. The reference user is dropped by id even if the pool
/// still contains it.
pub fn filter_nearby(reference: &User, candidates: Vec<User>, radius_km: f64) -> Vec<NearbyUser> {
    let mut nearby: Vec<NearbyUser> = candidates
        .into_iter()
        .filter(|candidate| candidate.id != reference.id)
        .filter_map(|candidate| {
            let distance_km = distance_between(reference.position, candidate.position);
            (distance_km < radius_km).then_some(NearbyUser {
                user: candidate,
                distance_km,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeoPoint;

    fn user_at(name: &str, latitude: f64, longitude: f64) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            position: GeoPoint::new(latitude, longitude),
            images: Vec::new(),
        }
    }

    #[test]
    fn keeps_only_candidates_inside_the_radius() {
        let reference = user_at("ref", 0.0, 0.0);
        let close = user_at("close", 0.0, 0.05);
        let far = user_at("far", 0.0, 1.0);

        let nearby = filter_nearby(&reference, vec![far, close.clone()], 10.0);

        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].user.id, close.id);
        assert!((nearby[0].distance_km - 5.56).abs() < 0.1);
    }

    #[test]
    fn excludes_the_reference_by_identity_not_position() {
        let reference = user_at("ref", 10.0, 10.0);
        let twin = user_at("twin", 10.0, 10.0);

        let nearby = filter_nearby(&reference, vec![reference.clone(), twin.clone()], 10.0);

        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].user.id, twin.id);
        assert_eq!(nearby[0].distance_km, 0.0);
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let reference = user_at("ref", 0.0, 0.0);
        let edge = user_at("edge", 0.0, 1.0);
        let exact = distance_between(reference.position, edge.position);

        assert!(filter_nearby(&reference, vec![edge.clone()], exact).is_empty());
        assert_eq!(filter_nearby(&reference, vec![edge], exact + 0.001).len(), 1);
    }

    #[test]
    fn results_are_sorted_nearest_first() {
        let reference = user_at("ref", 0.0, 0.0);
        let pool = vec![
            user_at("c", 0.0, 0.08),
            user_at("a", 0.0, 0.01),
            user_at("b", 0.0, 0.04),
        ];

        let names: Vec<_> = filter_nearby(&reference, pool, 10.0)
            .into_iter()
            .map(|n| n.user.name)
            .collect();

        assert_eq!(names, ["a", "b", "c"]);
    }
}
