//! Planar bearings, circular angle differences and great-circle distances.
//!
//! All angles are in degrees and all coordinates are WGS84 decimal degrees.

pub const DEFAULT_EARTH_RADIUS_KM: f64 = 6371.0;

/// Planar bearing from `from` toward `to`, in [0, 360).
///
/// Computed as `atan2(Δlat, Δlon)`, so 0° points east and angles grow
/// counter-clockwise. This is not a geodesic bearing; over a single cell the
/// distortion is negligible.
pub fn planar_bearing(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
    let degrees = (to_lat - from_lat).atan2(to_lon - from_lon).to_degrees();
    // atan2 lies in [-180, 180], so the shifted value stays positive.
    (degrees + 360.0) % 360.0
}

/// Smallest absolute difference between two directions, in [0, 180].
pub fn angular_difference(a: f64, b: f64) -> f64 {
    ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
}

/// Haversine distance in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64, earth_radius_km: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    earth_radius_km * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
