//! San Francisco locations and canned Google Maps payloads.

use trip_planner::model::Coordinate;
use trip_planner::polyline::Polyline;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub place_id: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, place_id: &'static str, lat: f64, lng: f64) -> Self {
        Self {
            name,
            place_id,
            lat,
            lng,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// ============================================================================
// Locations
// ============================================================================

/// Default map center of the screen.
pub const ALAMO_SQUARE: Location = Location::new("Alamo Square", "place-alamo", 37.78825, -122.4324);

/// One hundredth of a degree north of Alamo Square.
pub const LAFAYETTE_PARK: Location = Location::new("Lafayette Park", "place-lafayette", 37.79825, -122.4324);

pub const FERRY_BUILDING: Location = Location::new("Ferry Building", "place-ferry", 37.7955, -122.3937);

pub const TWIN_PEAKS: Location = Location::new("Twin Peaks", "place-twin-peaks", 37.7544, -122.4477);

pub const ALL: &[Location] = &[ALAMO_SQUARE, LAFAYETTE_PARK, FERRY_BUILDING, TWIN_PEAKS];

pub fn find(place_id: &str) -> Option<&'static Location> {
    ALL.iter().find(|location| location.place_id == place_id)
}

// ============================================================================
// Payloads
// ============================================================================

/// Encoded straight path through the given points.
pub fn encoded_path(points: &[Coordinate]) -> String {
    Polyline::new(points.to_vec()).encode()
}

/// A Directions API body with one route per `(path, meters, seconds)`.
pub fn directions_body(routes: &[(Vec<Coordinate>, u64, u64)]) -> String {
    let routes: Vec<serde_json::Value> = routes
        .iter()
        .enumerate()
        .map(|(index, (points, meters, seconds))| {
            serde_json::json!({
                "summary": format!("Route {}", index),
                "legs": [{
                    "distance": {"text": format!("{:.1} km", *meters as f64 / 1000.0), "value": meters},
                    "duration": {"text": format!("{} mins", seconds / 60), "value": seconds},
                }],
                "overview_polyline": {"points": encoded_path(points)},
            })
        })
        .collect();

    serde_json::json!({"status": "OK", "routes": routes}).to_string()
}

/// Two alternatives from Alamo Square to the Ferry Building.
pub fn alamo_to_ferry_body() -> String {
    let start = ALAMO_SQUARE.coordinate();
    let end = FERRY_BUILDING.coordinate();
    directions_body(&[
        (vec![start, Coordinate::new(37.7805, -122.4200), end], 4300, 840),
        (vec![start, Coordinate::new(37.7900, -122.4100), end], 4800, 960),
    ])
}

pub fn place_details_body(location: &Location) -> String {
    serde_json::json!({
        "status": "OK",
        "result": {"geometry": {"location": {"lat": location.lat, "lng": location.lng}}},
    })
    .to_string()
}
