//! Trip-planning screen state machine.
//!
//! The planner is a plain value driven by [`TripEvent`]s. Each event may
//! produce one [`Command`] for the host to execute (prompt for permission,
//! read the device position, fetch routes); the host feeds the outcome back
//! as another event. Nothing here blocks or performs I/O.
//!
//! Route searches are tagged with a [`SearchTicket`]. Only the response for
//! the current ticket is applied, so a slow answer to an old search can
//! never overwrite a newer one, and nothing lands after the screen is
//! dismissed.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{PlannerError, PlannerResult};
use crate::haversine::{format_km, haversine_km};
use crate::model::{
    Coordinate, DEFAULT_DELTA, MUTED_ROUTE_COLOR, MapScene, Marker, Region, Route, RouteCandidate, RouteLabel,
    RoutePath, TripSelection, TripStart,
};
use crate::traits::{DirectionsRequest, PermissionStatus};

pub const LOADING_MESSAGE: &str = "Loading location...";
pub const PERMISSION_DENIED_MESSAGE: &str = "Location permission denied";
pub const LOCATION_FAILED_MESSAGE: &str = "Unable to determine your location";

pub const ORIGIN_TITLE: &str = "Your location";
pub const DESTINATION_TITLE: &str = "Selected destination";
const ORIGIN_COLOR: &str = "#4285F4";
const DESTINATION_COLOR: &str = "#EA4335";

const ROUTE_WIDTH: f32 = 4.0;
const SELECTED_ROUTE_WIDTH: f32 = 6.0;

/// Extra span around routes when fitting the viewport, per side.
const FIT_PADDING: f64 = 0.1;

/// How the start-trip affordance is triggered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartMode {
    Tap,
    /// Swipeable button; fires once dragged past `threshold` (0..=1).
    Swipe { threshold: f64 },
}

/// Knobs that distinguish the variants of the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenOptions {
    /// Request alternative routes instead of only the best one.
    pub alternatives: bool,
    /// Show the straight-line origin/destination distance.
    pub show_distance: bool,
    /// Put a distance/duration label at each route's midpoint.
    pub show_route_labels: bool,
    pub start_mode: StartMode,
    /// Span used when zooming onto a single point.
    pub zoom_delta: f64,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            alternatives: true,
            show_distance: true,
            show_route_labels: true,
            start_mode: StartMode::Swipe { threshold: 0.8 },
            zoom_delta: DEFAULT_DELTA,
        }
    }
}

/// Identifies one route search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket(u64);

/// A settled search result, kept so a failed follow-up search can put
/// it back.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSet {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub routes: Vec<Route>,
    pub selected: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TripState {
    Idle,
    AwaitingPermission {
        pending_destination: Option<Coordinate>,
    },
    PermissionDenied,
    LocatingOrigin {
        pending_destination: Option<Coordinate>,
        failure: Option<String>,
    },
    AwaitingDestination {
        origin: Coordinate,
    },
    FetchingRoutes {
        origin: Coordinate,
        destination: Coordinate,
        ticket: SearchTicket,
        previous: Option<RouteSet>,
    },
    RoutesReady {
        origin: Coordinate,
        destination: Coordinate,
        routes: Vec<Route>,
    },
    RouteSelected {
        origin: Coordinate,
        destination: Coordinate,
        routes: Vec<Route>,
        selected: usize,
    },
}

#[derive(Debug)]
pub enum TripEvent {
    /// The screen was shown.
    Mounted,
    PermissionResolved(PermissionStatus),
    /// Device position query finished.
    OriginLocated(PlannerResult<Coordinate>),
    /// Origin picked from a place search.
    OriginChosen(Coordinate),
    /// Destination picked from a place search.
    DestinationChosen(Coordinate),
    RoutesFetched {
        ticket: SearchTicket,
        result: PlannerResult<Vec<Route>>,
    },
    RouteTapped(usize),
    /// The screen went away.
    Dismissed,
}

/// Work the host must perform and report back as an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Answer with [`TripEvent::PermissionResolved`].
    RequestPermission,
    /// Answer with [`TripEvent::OriginLocated`].
    LocateDevice,
    /// Answer with [`TripEvent::RoutesFetched`] carrying the same ticket.
    FetchRoutes {
        ticket: SearchTicket,
        request: DirectionsRequest,
    },
}

#[derive(Debug, Clone)]
pub struct TripPlanner {
    options: ScreenOptions,
    state: TripState,
    next_ticket: u64,
}

impl TripPlanner {
    pub fn new(options: ScreenOptions) -> Self {
        Self {
            options,
            state: TripState::Idle,
            next_ticket: 0,
        }
    }

    pub fn options(&self) -> &ScreenOptions {
        &self.options
    }

    pub fn state(&self) -> &TripState {
        &self.state
    }

    /// Whether an origin or destination choice would be acted on now.
    ///
    /// Before mounting and after a permission denial such choices are
    /// dropped, so there is no point resolving them.
    pub fn accepts_place_choice(&self) -> bool {
        !matches!(self.state, TripState::Idle | TripState::PermissionDenied)
    }

    /// Applies an event and returns the follow-up work, if any.
    pub fn handle(&mut self, event: TripEvent) -> Option<Command> {
        let state = std::mem::replace(&mut self.state, TripState::Idle);
        let (next, command) = self.transition(state, event);
        self.state = next;
        command
    }

    fn transition(&mut self, state: TripState, event: TripEvent) -> (TripState, Option<Command>) {
        use TripEvent::*;
        use TripState::*;

        match (state, event) {
            (_, Dismissed) => {
                debug!("screen dismissed");
                (Idle, None)
            }

            (Idle, Mounted) => (
                AwaitingPermission {
                    pending_destination: None,
                },
                Some(Command::RequestPermission),
            ),

            (AwaitingPermission { pending_destination }, PermissionResolved(PermissionStatus::Granted)) => (
                LocatingOrigin {
                    pending_destination,
                    failure: None,
                },
                Some(Command::LocateDevice),
            ),

            (AwaitingPermission { .. }, PermissionResolved(PermissionStatus::Denied))
            | (AwaitingPermission { .. } | LocatingOrigin { .. }, OriginLocated(Err(PlannerError::PermissionDenied))) => {
                info!("location permission denied");
                (PermissionDenied, None)
            }

            (LocatingOrigin { pending_destination, .. }, OriginLocated(Ok(origin))) => {
                self.origin_resolved(origin, pending_destination)
            }

            (LocatingOrigin { pending_destination, .. }, OriginLocated(Err(err))) => {
                warn!(error = %err, "failed to locate device");
                (
                    LocatingOrigin {
                        pending_destination,
                        failure: Some(LOCATION_FAILED_MESSAGE.to_string()),
                    },
                    None,
                )
            }

            (
                AwaitingPermission { pending_destination } | LocatingOrigin { pending_destination, .. },
                OriginChosen(origin),
            ) => self.origin_resolved(origin, pending_destination),

            (AwaitingDestination { .. }, OriginChosen(origin)) => (AwaitingDestination { origin }, None),

            (
                FetchingRoutes {
                    destination, previous, ..
                },
                OriginChosen(origin),
            ) => self.start_search(origin, destination, previous),

            (AwaitingPermission { .. }, DestinationChosen(destination)) => (
                AwaitingPermission {
                    pending_destination: Some(destination),
                },
                None,
            ),

            (LocatingOrigin { failure, .. }, DestinationChosen(destination)) => {
                debug!("destination chosen before origin resolved, holding it");
                (
                    LocatingOrigin {
                        pending_destination: Some(destination),
                        failure,
                    },
                    None,
                )
            }

            (AwaitingDestination { origin }, DestinationChosen(destination)) => {
                self.start_search(origin, destination, None)
            }

            (FetchingRoutes { origin, previous, .. }, DestinationChosen(destination)) => {
                self.start_search(origin, destination, previous)
            }

            (
                RoutesReady {
                    origin,
                    destination,
                    routes,
                },
                event @ (OriginChosen(_) | DestinationChosen(_)),
            ) => self.research(
                RouteSet {
                    origin,
                    destination,
                    routes,
                    selected: None,
                },
                event,
            ),

            (
                RouteSelected {
                    origin,
                    destination,
                    routes,
                    selected,
                },
                event @ (OriginChosen(_) | DestinationChosen(_)),
            ) => self.research(
                RouteSet {
                    origin,
                    destination,
                    routes,
                    selected: Some(selected),
                },
                event,
            ),

            (
                FetchingRoutes {
                    origin,
                    destination,
                    ticket,
                    previous,
                },
                RoutesFetched { ticket: received, result },
            ) if received == ticket => match result {
                Ok(mut routes) => {
                    if !self.options.alternatives {
                        routes.truncate(1);
                    }
                    debug!(?ticket, count = routes.len(), "routes ready");
                    (
                        RoutesReady {
                            origin,
                            destination,
                            routes,
                        },
                        None,
                    )
                }
                Err(err) => {
                    warn!(?ticket, error = %err, "route search failed, keeping previous state");
                    (restore(previous, origin), None)
                }
            },

            (state, RoutesFetched { ticket, .. }) => {
                warn!(?ticket, "dropping stale route response");
                (state, None)
            }

            (
                RoutesReady {
                    origin,
                    destination,
                    routes,
                }
                | RouteSelected {
                    origin,
                    destination,
                    routes,
                    ..
                },
                RouteTapped(index),
            ) if index < routes.len() => {
                debug!(index, "route selected");
                (
                    RouteSelected {
                        origin,
                        destination,
                        routes,
                        selected: index,
                    },
                    None,
                )
            }

            (state, event) => {
                debug!(?event, "event ignored in current state");
                (state, None)
            }
        }
    }

    fn origin_resolved(
        &mut self,
        origin: Coordinate,
        pending_destination: Option<Coordinate>,
    ) -> (TripState, Option<Command>) {
        match pending_destination {
            Some(destination) => self.start_search(origin, destination, None),
            None => (TripState::AwaitingDestination { origin }, None),
        }
    }

    /// Starts a new search from a settled result, changing one end.
    fn research(&mut self, previous: RouteSet, event: TripEvent) -> (TripState, Option<Command>) {
        let (origin, destination) = match event {
            TripEvent::OriginChosen(origin) => (origin, previous.destination),
            TripEvent::DestinationChosen(destination) => (previous.origin, destination),
            _ => (previous.origin, previous.destination),
        };
        self.start_search(origin, destination, Some(previous))
    }

    fn start_search(
        &mut self,
        origin: Coordinate,
        destination: Coordinate,
        previous: Option<RouteSet>,
    ) -> (TripState, Option<Command>) {
        self.next_ticket += 1;
        let ticket = SearchTicket(self.next_ticket);
        let request = DirectionsRequest {
            origin,
            destination,
            alternatives: self.options.alternatives,
        };
        debug!(?ticket, "starting route search");

        (
            TripState::FetchingRoutes {
                origin,
                destination,
                ticket,
                previous,
            },
            Some(Command::FetchRoutes { ticket, request }),
        )
    }

    pub fn selection(&self) -> TripSelection {
        match &self.state {
            TripState::Idle | TripState::PermissionDenied => TripSelection::default(),
            TripState::AwaitingPermission { pending_destination }
            | TripState::LocatingOrigin {
                pending_destination, ..
            } => TripSelection {
                destination: *pending_destination,
                ..TripSelection::default()
            },
            TripState::AwaitingDestination { origin } => TripSelection {
                origin: Some(*origin),
                ..TripSelection::default()
            },
            TripState::FetchingRoutes {
                origin, destination, ..
            }
            | TripState::RoutesReady {
                origin, destination, ..
            } => TripSelection {
                origin: Some(*origin),
                destination: Some(*destination),
                selected_route: None,
            },
            TripState::RouteSelected {
                origin,
                destination,
                selected,
                ..
            } => TripSelection {
                origin: Some(*origin),
                destination: Some(*destination),
                selected_route: Some(*selected),
            },
        }
    }

    /// Routes of the current search; empty while a search is in flight.
    pub fn routes(&self) -> &[Route] {
        match &self.state {
            TripState::RoutesReady { routes, .. } | TripState::RouteSelected { routes, .. } => routes,
            _ => &[],
        }
    }

    pub fn selected_route(&self) -> Option<&Route> {
        match &self.state {
            TripState::RouteSelected { routes, selected, .. } => routes.get(*selected),
            _ => None,
        }
    }

    pub fn can_start(&self) -> bool {
        self.selection().is_resolved()
    }

    /// Payload for the trip-in-progress flow. Uses the selected route, or
    /// the provider's first choice when none was tapped.
    pub fn start_trip(&self) -> Option<TripStart> {
        let selection = self.selection();
        let (origin, destination) = (selection.origin?, selection.destination?);
        let route = self.selected_route().or_else(|| self.routes().first()).cloned();
        info!(route = ?route.as_ref().map(|route| route.index), "starting trip");

        Some(TripStart {
            origin,
            destination,
            route,
        })
    }

    /// Feeds the swipe button's drag progress (0..=1). Starts the trip
    /// once the threshold is crossed.
    pub fn swipe_to_start(&self, progress: f64) -> Option<TripStart> {
        match self.options.start_mode {
            StartMode::Swipe { threshold } if progress.clamp(0.0, 1.0) >= threshold => self.start_trip(),
            _ => None,
        }
    }

    /// Text shown instead of (or over) the map.
    pub fn status_message(&self) -> Option<&str> {
        match &self.state {
            TripState::AwaitingPermission { .. } => Some(LOADING_MESSAGE),
            TripState::LocatingOrigin { failure, .. } => Some(failure.as_deref().unwrap_or(LOADING_MESSAGE)),
            TripState::PermissionDenied => Some(PERMISSION_DENIED_MESSAGE),
            _ => None,
        }
    }

    /// Describes the map. `None` while there is no origin to show.
    pub fn scene(&self) -> Option<MapScene> {
        let selection = self.selection();
        let origin = selection.origin?;

        let mut markers = vec![Marker {
            coordinate: origin,
            title: ORIGIN_TITLE.to_string(),
            description: Some("You are here".to_string()),
            color: Some(ORIGIN_COLOR),
        }];
        if let Some(destination) = selection.destination {
            markers.push(Marker {
                coordinate: destination,
                title: DESTINATION_TITLE.to_string(),
                description: None,
                color: Some(DESTINATION_COLOR),
            });
        }

        let routes = self.routes();
        let selected = selection.selected_route;
        let mut paths: Vec<RoutePath> = routes
            .iter()
            .map(|route| {
                let is_selected = selected == Some(route.index);
                RoutePath {
                    index: route.index,
                    points: route.path.points().to_vec(),
                    color: match selected {
                        Some(_) if !is_selected => MUTED_ROUTE_COLOR,
                        _ => route.color,
                    },
                    width: if is_selected { SELECTED_ROUTE_WIDTH } else { ROUTE_WIDTH },
                    selected: is_selected,
                }
            })
            .collect();
        // Selected path last so it draws on top.
        paths.sort_by_key(|path| path.selected);

        let labels = if self.options.show_route_labels {
            routes
                .iter()
                .filter_map(|route| {
                    route.midpoint.map(|coordinate| RouteLabel {
                        index: route.index,
                        coordinate,
                        text: route.label(),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let distance_label = selection
            .destination
            .filter(|_| self.options.show_distance)
            .map(|destination| format_km(haversine_km(origin, destination)));

        let region = match selection.destination {
            None => Region::around(origin, self.options.zoom_delta),
            Some(destination) => {
                let all = markers
                    .iter()
                    .map(|marker| &marker.coordinate)
                    .chain(routes.iter().flat_map(|route| route.path.points()));
                Region::fitting(all, FIT_PADDING, self.options.zoom_delta)
                    .unwrap_or_else(|| Region::around(destination, self.options.zoom_delta))
            }
        };

        Some(MapScene {
            region,
            markers,
            paths,
            labels,
            distance_label,
            can_start: selection.is_resolved(),
        })
    }
}

impl Default for TripPlanner {
    fn default() -> Self {
        Self::new(ScreenOptions::default())
    }
}

/// Decodes provider candidates into display routes, in parallel.
pub fn build_routes(candidates: Vec<RouteCandidate>) -> PlannerResult<Vec<Route>> {
    candidates
        .into_par_iter()
        .enumerate()
        .map(|(index, candidate)| Route::from_candidate(index, candidate))
        .collect()
}

fn restore(previous: Option<RouteSet>, origin: Coordinate) -> TripState {
    match previous {
        Some(RouteSet {
            origin,
            destination,
            routes,
            selected: Some(selected),
        }) => TripState::RouteSelected {
            origin,
            destination,
            routes,
            selected,
        },
        Some(RouteSet {
            origin,
            destination,
            routes,
            selected: None,
        }) => TripState::RoutesReady {
            origin,
            destination,
            routes,
        },
        None => TripState::AwaitingDestination { origin },
    }
}
