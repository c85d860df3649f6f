use proptest::prelude::*;

use trip_planner::haversine::{EARTH_RADIUS_KM, haversine_km};
use trip_planner::model::Coordinate;

prop_compose! {
    fn coordinate()(latitude in -90.0f64..=90.0, longitude in -180.0f64..=180.0) -> Coordinate {
        Coordinate::new(latitude, longitude)
    }
}

proptest! {
    #[test]
    fn distance_is_finite_and_bounded(from in coordinate(), to in coordinate()) {
        let dist = haversine_km(from, to);
        prop_assert!(dist.is_finite());
        prop_assert!(dist >= 0.0);
        prop_assert!(dist <= EARTH_RADIUS_KM * std::f64::consts::PI + 1e-6);
    }

    #[test]
    fn antipodal_points_are_half_a_circumference_apart(point in coordinate()) {
        let antipode = Coordinate::new(-point.latitude, point.longitude + 180.0);
        let dist = haversine_km(point, antipode);
        prop_assert!((dist - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-3, "got {}", dist);
    }
}
