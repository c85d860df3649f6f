//! Google Maps HTTP adapter for directions and place details.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::GoogleMapsConfig;
use crate::error::{PlannerError, PlannerResult};
use crate::model::{Coordinate, Measure, RouteCandidate};
use crate::traits::{DirectionsProvider, DirectionsRequest, PlaceResolver};

const DIRECTIONS_PATH: &str = "/maps/api/directions/json";
const PLACE_DETAILS_PATH: &str = "/maps/api/place/details/json";

#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    config: GoogleMapsConfig,
    client: reqwest::blocking::Client,
}

impl GoogleMapsClient {
    pub fn new(config: GoogleMapsConfig) -> PlannerResult<Self> {
        let mut builder =
            reqwest::blocking::Client::builder().timeout(std::time::Duration::from_secs(config.timeout_secs));
        // Local endpoints (stubs, on-device mocks) never go through a system proxy.
        if is_loopback(&config.base_url) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GoogleMapsConfig {
        &self.config
    }

    /// GETs `path` and decodes the JSON body, retrying transport errors
    /// and 5xx answers up to `max_retries` times.
    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> PlannerResult<T> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut attempt = 0;

        loop {
            match self.fetch_once(&url, query) {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.config.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    warn!(path, attempt, error = %err, "retrying google maps request");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn fetch_once<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> PlannerResult<T> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.config.api_key.as_str())]);
        if let Some(language) = &self.config.language {
            request = request.query(&[("language", language.as_str())]);
        }

        // Errors carry the request URL, which includes the key.
        let response = request.send().map_err(|err| err.without_url())?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlannerError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response.json::<T>().map_err(|err| {
            if err.is_decode() {
                PlannerError::MalformedResponse(err.without_url().to_string())
            } else {
                err.without_url().into()
            }
        })
    }
}

impl DirectionsProvider for GoogleMapsClient {
    #[tracing::instrument(skip(self))]
    fn directions(&self, request: &DirectionsRequest) -> PlannerResult<Vec<RouteCandidate>> {
        let query = [
            ("origin", format_location(request.origin)),
            ("destination", format_location(request.destination)),
            ("alternatives", request.alternatives.to_string()),
            ("mode", "driving".to_string()),
        ];

        let response = self.get_json(DIRECTIONS_PATH, &query)?;
        let candidates = route_candidates(response)?;
        debug!(count = candidates.len(), "received route candidates");
        Ok(candidates)
    }
}

impl PlaceResolver for GoogleMapsClient {
    #[tracing::instrument(skip(self))]
    fn resolve_place(&self, place_id: &str) -> PlannerResult<Coordinate> {
        let query = [
            ("place_id", place_id.to_string()),
            ("fields", "geometry".to_string()),
        ];

        let response = self.get_json(PLACE_DETAILS_PATH, &query)?;
        place_location(response)
    }
}

/// Extracts route candidates from a Directions API payload.
///
/// `ZERO_RESULTS` is not an error: it yields an empty list.
pub fn parse_directions(body: &str) -> PlannerResult<Vec<RouteCandidate>> {
    route_candidates(serde_json::from_str(body)?)
}

fn route_candidates(response: DirectionsResponse) -> PlannerResult<Vec<RouteCandidate>> {
    check_status(&response.status, response.error_message, &["OK", "ZERO_RESULTS"])?;

    response
        .routes
        .into_iter()
        .enumerate()
        .map(|(index, route)| -> PlannerResult<RouteCandidate> {
            let leg = route
                .legs
                .into_iter()
                .next()
                .ok_or_else(|| PlannerError::MalformedResponse(format!("route {} has no legs", index)))?;
            let missing = |field: &str| PlannerError::MalformedResponse(format!("route {} has no {}", index, field));

            Ok(RouteCandidate {
                encoded_path: route
                    .overview_polyline
                    .ok_or_else(|| missing("overview_polyline"))?
                    .points,
                distance: leg.distance.ok_or_else(|| missing("distance"))?,
                duration: leg.duration.ok_or_else(|| missing("duration"))?,
                summary: route.summary.filter(|summary| !summary.is_empty()),
            })
        })
        .collect()
}

/// Extracts the location from a Place Details API payload.
pub fn parse_place_details(body: &str) -> PlannerResult<Coordinate> {
    place_location(serde_json::from_str(body)?)
}

fn place_location(response: PlaceDetailsResponse) -> PlannerResult<Coordinate> {
    check_status(&response.status, response.error_message, &["OK"])?;

    response
        .result
        .and_then(|result| result.geometry)
        .map(|geometry| Coordinate::new(geometry.location.lat, geometry.location.lng))
        .ok_or_else(|| PlannerError::MalformedResponse("place has no geometry".to_string()))
}

fn check_status(status: &str, message: Option<String>, accepted: &[&str]) -> PlannerResult<()> {
    if accepted.contains(&status) {
        Ok(())
    } else {
        Err(PlannerError::ApiStatus {
            status: status.to_string(),
            message: message.unwrap_or_default(),
        })
    }
}

fn is_retryable(err: &PlannerError) -> bool {
    match err {
        PlannerError::NetworkFailure(_) => true,
        PlannerError::HttpStatus { status } => *status >= 500,
        _ => false,
    }
}

fn is_loopback(base_url: &str) -> bool {
    let host = base_url
        .split_once("://")
        .map_or(base_url, |(_, rest)| rest)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    host == "localhost" || host == "127.0.0.1"
}

fn format_location(point: Coordinate) -> String {
    format!("{:.6},{:.6}", point.latitude, point.longitude)
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    legs: Vec<ApiLeg>,
    overview_polyline: Option<ApiPolyline>,
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    distance: Option<Measure>,
    duration: Option<Measure>,
}

#[derive(Debug, Deserialize)]
struct ApiPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    status: String,
    error_message: Option<String>,
    result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directions_two_routes() {
        let body = r#"{
            "status": "OK",
            "routes": [
                {
                    "summary": "US-101 S",
                    "legs": [{
                        "distance": {"text": "5.2 km", "value": 5210},
                        "duration": {"text": "12 mins", "value": 720}
                    }],
                    "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"}
                },
                {
                    "summary": "",
                    "legs": [{
                        "distance": {"text": "6.0 km", "value": 6004},
                        "duration": {"text": "15 mins", "value": 900}
                    }],
                    "overview_polyline": {"points": "_p~iF~ps|U"}
                }
            ]
        }"#;

        let candidates = parse_directions(body).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].distance.value, 5210);
        assert_eq!(candidates[0].duration.text, "12 mins");
        assert_eq!(candidates[0].summary.as_deref(), Some("US-101 S"));
        assert_eq!(candidates[1].encoded_path, "_p~iF~ps|U");
        assert_eq!(candidates[1].summary, None);
    }

    #[test]
    fn test_parse_directions_zero_results() {
        let candidates = parse_directions(r#"{"status": "ZERO_RESULTS", "routes": []}"#).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_parse_directions_denied() {
        let err = parse_directions(r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#).unwrap_err();
        match err {
            PlannerError::ApiStatus { status, message } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_directions_missing_legs() {
        let body = r#"{"status": "OK", "routes": [{"legs": [], "overview_polyline": {"points": "??"}}]}"#;
        assert!(matches!(parse_directions(body), Err(PlannerError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_directions_missing_polyline() {
        let body = r#"{"status": "OK", "routes": [{"legs": [{
            "distance": {"text": "1 km", "value": 1000},
            "duration": {"text": "1 min", "value": 60}
        }]}]}"#;
        assert!(matches!(parse_directions(body), Err(PlannerError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_directions_not_json() {
        assert!(matches!(parse_directions("<html>"), Err(PlannerError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_place_details() {
        let body = r#"{
            "status": "OK",
            "result": {"geometry": {"location": {"lat": 37.79825, "lng": -122.4324}}}
        }"#;
        let location = parse_place_details(body).unwrap();
        assert_eq!(location, Coordinate::new(37.79825, -122.4324));
    }

    #[test]
    fn test_parse_place_details_without_geometry() {
        let body = r#"{"status": "OK", "result": {}}"#;
        assert!(matches!(parse_place_details(body), Err(PlannerError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_place_details_not_found() {
        let err = parse_place_details(r#"{"status": "NOT_FOUND"}"#).unwrap_err();
        assert!(matches!(err, PlannerError::ApiStatus { .. }));
    }

    #[test]
    fn test_retry_policy() {
        assert!(is_retryable(&PlannerError::HttpStatus { status: 503 }));
        assert!(!is_retryable(&PlannerError::HttpStatus { status: 404 }));
        assert!(!is_retryable(&PlannerError::MalformedResponse("x".into())));
    }

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback("http://127.0.0.1:8080"));
        assert!(is_loopback("http://localhost"));
        assert!(!is_loopback("https://maps.googleapis.com"));
    }

    #[test]
    fn test_format_location() {
        assert_eq!(format_location(Coordinate::new(37.78825, -122.4324)), "37.788250,-122.432400");
    }
}
