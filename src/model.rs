//! Value types shared by the planner, the HTTP adapter and map surfaces.

use serde::{Deserialize, Serialize};

use crate::polyline::Polyline;

/// Default viewport span in degrees around a single point.
pub const DEFAULT_DELTA: f64 = 0.01;

/// Colors assigned to candidate routes, by index.
pub const ROUTE_COLORS: [&str; 4] = ["#4285F4", "#34A853", "#FBBC05", "#EA4335"];

/// Color used for routes that are not selected while another one is.
pub const MUTED_ROUTE_COLOR: &str = "#9E9E9E";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// A map viewport: center plus the latitude/longitude span to show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub fn around(center: Coordinate, delta: f64) -> Self {
        Self {
            center,
            latitude_delta: delta,
            longitude_delta: delta,
        }
    }

    /// Smallest region containing every point, grown by `padding` (a
    /// fraction of the span on each axis). Spans never shrink below
    /// `min_delta` so a single point still gets a sensible zoom.
    ///
    /// Returns `None` for an empty set of points.
    ///
    /// Longitudes are compared as plain numbers, so a path crossing the
    /// antimeridian gets a span close to 360 degrees rather than the short
    /// way around.
    pub fn fitting<'a, I>(points: I, padding: f64, min_delta: f64) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_lat, mut max_lat) = (first.latitude, first.latitude);
        let (mut min_lng, mut max_lng) = (first.longitude, first.longitude);

        for point in iter {
            min_lat = min_lat.min(point.latitude);
            max_lat = max_lat.max(point.latitude);
            min_lng = min_lng.min(point.longitude);
            max_lng = max_lng.max(point.longitude);
        }

        let lat_span = (max_lat - min_lat) * (1.0 + 2.0 * padding);
        let lng_span = (max_lng - min_lng) * (1.0 + 2.0 * padding);

        Some(Self {
            center: Coordinate::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0),
            latitude_delta: lat_span.max(min_delta),
            longitude_delta: lng_span.max(min_delta),
        })
    }
}

/// A human-readable label from the routing API with its numeric value
/// (meters for distances, seconds for durations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub text: String,
    pub value: u64,
}

/// A candidate route exactly as the directions provider returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCandidate {
    pub encoded_path: String,
    pub distance: Measure,
    pub duration: Measure,
    pub summary: Option<String>,
}

/// A decoded candidate route ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Position among the alternatives of one response.
    pub index: usize,
    pub path: Polyline,
    pub distance: Measure,
    pub duration: Measure,
    pub summary: Option<String>,
    pub color: &'static str,
    /// Where the distance/duration label goes.
    pub midpoint: Option<Coordinate>,
}

impl Route {
    /// Decodes a candidate's path and assigns its display color.
    pub fn from_candidate(index: usize, candidate: RouteCandidate) -> crate::error::PlannerResult<Self> {
        let path = Polyline::decode(&candidate.encoded_path)?;
        let midpoint = path.midpoint();

        Ok(Self {
            index,
            path,
            distance: candidate.distance,
            duration: candidate.duration,
            summary: candidate.summary,
            color: ROUTE_COLORS[index % ROUTE_COLORS.len()],
            midpoint,
        })
    }

    pub fn label(&self) -> String {
        format!("{} · {}", self.distance.text, self.duration.text)
    }
}

/// What the user has picked so far. Lives only as long as the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TripSelection {
    pub origin: Option<Coordinate>,
    pub destination: Option<Coordinate>,
    pub selected_route: Option<usize>,
}

impl TripSelection {
    pub fn is_resolved(&self) -> bool {
        self.origin.is_some() && self.destination.is_some()
    }
}

/// Payload handed to the trip-in-progress flow when the user starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripStart {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub route: Option<Route>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<&'static str>,
}

/// A path to draw on the map. Tapping it selects route `index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePath {
    pub index: usize,
    pub points: Vec<Coordinate>,
    pub color: &'static str,
    pub width: f32,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLabel {
    pub index: usize,
    pub coordinate: Coordinate,
    pub text: String,
}

/// Everything a map surface needs to draw one frame of the screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScene {
    pub region: Region,
    pub markers: Vec<Marker>,
    pub paths: Vec<RoutePath>,
    pub labels: Vec<RouteLabel>,
    /// Straight-line origin to destination distance, e.g. `"1.11 km"`.
    pub distance_label: Option<String>,
    pub can_start: bool,
}
