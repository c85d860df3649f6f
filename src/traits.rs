//! Seams to the vendor services the planner depends on.
//!
//! The planner never talks to a device, a map widget or an HTTP API
//! directly. Concrete apps implement these for their platform; the crate
//! ships a Google Maps implementation of the two HTTP-backed ones.

use crate::error::PlannerResult;
use crate::model::{Coordinate, MapScene, RouteCandidate};

/// Outcome of a foreground location permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Permission-gated, one-shot device position.
pub trait LocationProvider {
    fn request_permission(&self) -> PermissionStatus;

    fn current_position(&self) -> PlannerResult<Coordinate>;
}

/// Resolves a place identifier from an autocomplete selection.
pub trait PlaceResolver {
    fn resolve_place(&self, place_id: &str) -> PlannerResult<Coordinate>;
}

/// A directions query between two resolved points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionsRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Ask for alternative routes, not only the best one.
    pub alternatives: bool,
}

/// Provides candidate driving routes.
///
/// Candidates are returned in provider order; an empty list means the
/// provider found no route.
pub trait DirectionsProvider {
    fn directions(&self, request: &DirectionsRequest) -> PlannerResult<Vec<RouteCandidate>>;
}

/// Something that can draw the screen.
pub trait MapSurface {
    fn render(&mut self, scene: &MapScene);

    /// Shown instead of the map while it cannot be rendered.
    fn show_message(&mut self, message: &str);
}
