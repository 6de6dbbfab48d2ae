//! Geodesic helpers for target navigation.
//!
//! Bearings follow the compass convention: degrees in [0, 360), 0 = north.

use hexos_types::GeoPoint;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Normalize a heading into [0, 360).
pub fn normalize_heading(deg: f32) -> f32 {
    deg.rem_euclid(360.0)
}

/// Signed smallest rotation from `heading` to `bearing`, in (-180, 180].
/// Positive means turn left (counterclockwise in compass terms is handled by
/// the caller's turn convention); the magnitude is always the short way round.
pub fn signed_delta_deg(bearing: f32, heading: f32) -> f32 {
    let mut delta = bearing - heading;
    while delta > 180.0 {
        delta -= 360.0;
    }
    while delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Initial great-circle bearing from `from` to `to`, in compass degrees.
pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Haversine great-circle distance between two points, in meters.
pub fn distance_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    #[test]
    fn heading_wraps_into_compass_range() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(725.0), 5.0);
    }

    #[test]
    fn delta_takes_the_short_way_round() {
        assert_eq!(signed_delta_deg(10.0, 350.0), 20.0);
        assert_eq!(signed_delta_deg(350.0, 10.0), -20.0);
        assert_eq!(signed_delta_deg(90.0, 90.0), 0.0);
        assert_eq!(signed_delta_deg(270.0, 90.0), 180.0);
    }

    #[test]
    fn bearing_due_north_and_east() {
        let origin = p(50.0, 14.0);
        assert!((bearing_deg(origin, p(51.0, 14.0)) - 0.0).abs() < 0.1);
        let east = bearing_deg(origin, p(50.0, 14.1));
        assert!((east - 90.0).abs() < 0.5, "east bearing was {east}");
    }

    #[test]
    fn distance_of_one_degree_latitude() {
        // One degree of latitude is ~111.2 km everywhere.
        let d = distance_m(p(50.0, 14.0), p(51.0, 14.0));
        assert!((d - 111_195.0).abs() < 200.0, "distance was {d}");
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let a = p(48.8566, 2.3522);
        assert_eq!(distance_m(a, a), 0.0);
    }
}
