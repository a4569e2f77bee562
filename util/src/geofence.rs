//! Geofence calculator: great-circle distance and radius containment.
//!
//! Pure functions, no side effects. Callers are responsible for presence
//! checks on coordinates; only numeric finiteness is assumed here.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, as used by the Haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A circular allowed-region: center coordinates plus a radius in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "radius")]
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_meters,
        }
    }

    /// Distance in meters from this fence's center to the given point.
    pub fn distance_to(&self, latitude: f64, longitude: f64) -> f64 {
        distance_meters(self.latitude, self.longitude, latitude, longitude)
    }
}

/// Haversine great-circle distance between two coordinates, in meters.
///
/// Identical points yield exactly `0.0`.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin() * (delta_phi / 2.0).sin()
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin() * (delta_lambda / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Radius containment test: a distance exactly on the boundary passes.
pub fn within_radius(distance: f64, radius: f64) -> bool {
    distance <= radius
}
