//! trip-planner core
//!
//! Route search and selection for a trip-planning screen: polyline
//! decoding, straight-line distances, a Google Maps directions adapter and
//! the screen's state machine.

pub mod error;
pub mod model;
pub mod traits;
pub mod config;
pub mod google;
pub mod planner;
pub mod session;
pub mod haversine;
pub mod polyline;

pub use error::{PlannerError, PlannerResult};
pub use model::{Coordinate, Route, TripSelection, TripStart};
pub use planner::{ScreenOptions, TripEvent, TripPlanner, TripState};
