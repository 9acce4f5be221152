//! Great-circle distance on a spherical Earth

use mcs_core::GeoPoint;

/// Mean Earth radius used by the Haversine formula (meters)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate length of one degree of latitude (meters)
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Haversine distance in meters between two points given in degrees.
///
/// Inputs are not range-checked.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for near-antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Distance helpers on [`GeoPoint`]
pub trait Distance {
    fn distance_to(&self, other: &GeoPoint) -> f64;
}

impl Distance for GeoPoint {
    fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}
