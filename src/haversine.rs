//! Straight-line (great-circle) distance between two coordinates.
//!
//! Shown next to the route alternatives as the "as the crow flies"
//! distance; the road distance comes from the directions provider.

use crate::model::Coordinate;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    // Rounding can push `a` just past 1.0 for near-antipodal points.
    let a = ((delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Rounds a distance to two decimal places for display.
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Formats a distance for display, e.g. `"1.11 km"`.
pub fn format_km(km: f64) -> String {
    format!("{:.2} km", round_km(km))
}
