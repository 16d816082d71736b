//! crates/matching_core/src/geo.rs
//!
//! Great-circle distance between two points on the Earth's surface.

use crate::domain::GeoPoint;

/// Mean radius of the Earth in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two coordinates given in degrees.
///
/// Every finite input is valid, including poles and antipodal pairs.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] near antipodes.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Same as [`distance_km`] for two [`GeoPoint`]s.
pub fn distance_between(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_km(a.latitude, a.longitude, b.latitude, b.longitude)
}
