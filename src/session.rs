//! Synchronous driver wiring a [`TripPlanner`] to concrete providers.

use tracing::{debug, warn};

use crate::error::PlannerResult;
use crate::model::{Coordinate, TripStart};
use crate::planner::{Command, ScreenOptions, TripEvent, TripPlanner, build_routes};
use crate::traits::{DirectionsProvider, LocationProvider, MapSurface, PlaceResolver};

/// Runs planner commands inline against the given providers.
///
/// Suits hosts whose event loop tolerates blocking calls (CLIs, tests).
/// Hosts with their own executor can drive [`TripPlanner`] directly and
/// run the commands however they like.
pub struct TripSession<L, P, D> {
    planner: TripPlanner,
    location: L,
    places: P,
    directions: D,
}

impl<L, P, D> TripSession<L, P, D>
where
    L: LocationProvider,
    P: PlaceResolver,
    D: DirectionsProvider,
{
    pub fn new(options: ScreenOptions, location: L, places: P, directions: D) -> Self {
        Self {
            planner: TripPlanner::new(options),
            location,
            places,
            directions,
        }
    }

    pub fn planner(&self) -> &TripPlanner {
        &self.planner
    }

    /// Applies an event and runs every command it triggers.
    pub fn dispatch(&mut self, event: TripEvent) {
        let mut next = self.planner.handle(event);
        while let Some(command) = next {
            let outcome = self.execute(command);
            next = self.planner.handle(outcome);
        }
    }

    fn execute(&self, command: Command) -> TripEvent {
        match command {
            Command::RequestPermission => TripEvent::PermissionResolved(self.location.request_permission()),
            Command::LocateDevice => TripEvent::OriginLocated(self.location.current_position()),
            Command::FetchRoutes { ticket, request } => TripEvent::RoutesFetched {
                ticket,
                result: self.directions.directions(&request).and_then(build_routes),
            },
        }
    }

    pub fn mount(&mut self) {
        self.dispatch(TripEvent::Mounted);
    }

    pub fn dismiss(&mut self) {
        self.dispatch(TripEvent::Dismissed);
    }

    pub fn choose_origin(&mut self, origin: Coordinate) {
        self.dispatch(TripEvent::OriginChosen(origin));
    }

    pub fn choose_destination(&mut self, destination: Coordinate) {
        self.dispatch(TripEvent::DestinationChosen(destination));
    }

    /// Resolves an autocomplete selection and uses it as the origin.
    ///
    /// Returns `Ok(false)` without a lookup when the screen is not taking
    /// choices (not mounted, or permission denied). On failure the error
    /// is logged and returned; planner state is left as it was.
    pub fn choose_origin_place(&mut self, place_id: &str) -> PlannerResult<bool> {
        if !self.planner.accepts_place_choice() {
            debug!(place_id, "origin choice ignored in current state");
            return Ok(false);
        }
        let origin = self.resolve(place_id)?;
        self.choose_origin(origin);
        Ok(true)
    }

    /// Resolves an autocomplete selection and uses it as the destination.
    pub fn choose_destination_place(&mut self, place_id: &str) -> PlannerResult<bool> {
        if !self.planner.accepts_place_choice() {
            debug!(place_id, "destination choice ignored in current state");
            return Ok(false);
        }
        let destination = self.resolve(place_id)?;
        self.choose_destination(destination);
        Ok(true)
    }

    fn resolve(&self, place_id: &str) -> PlannerResult<Coordinate> {
        self.places.resolve_place(place_id).inspect_err(|err| {
            warn!(place_id, error = %err, "place lookup failed");
        })
    }

    pub fn tap_route(&mut self, index: usize) {
        self.dispatch(TripEvent::RouteTapped(index));
    }

    pub fn start_trip(&self) -> Option<TripStart> {
        self.planner.start_trip()
    }

    pub fn swipe_to_start(&self, progress: f64) -> Option<TripStart> {
        self.planner.swipe_to_start(progress)
    }

    /// Draws the map, or the status message while there is none.
    pub fn render<S: MapSurface>(&self, surface: &mut S) {
        match self.planner.scene() {
            Some(scene) => surface.render(&scene),
            None => surface.show_message(self.planner.status_message().unwrap_or_default()),
        }
    }
}
