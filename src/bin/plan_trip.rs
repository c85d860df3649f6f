//! plan-trip: query routes between two points from the command line.
//!
//! Usage:
//!   plan-trip --origin 37.78825,-122.4324 --destination 37.79825,-122.4324
//!   plan-trip --origin 37.78825,-122.4324 --destination-place <PLACE_ID> --select 1 --start
//!
//! Reads GOOGLE_MAPS_API_KEY (and friends) from the environment or a
//! `.env` file.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use trip_planner::config::GoogleMapsConfig;
use trip_planner::google::GoogleMapsClient;
use trip_planner::model::{Coordinate, MapScene};
use trip_planner::planner::{ScreenOptions, StartMode};
use trip_planner::session::TripSession;
use trip_planner::traits::{LocationProvider, MapSurface, PermissionStatus};
use trip_planner::{PlannerError, PlannerResult};

#[derive(Parser)]
#[command(name = "plan-trip")]
#[command(about = "Fetch and compare driving routes between two points", long_about = None)]
struct Cli {
    /// Start point as "lat,lng" (stands in for the device position)
    #[arg(long, value_parser = parse_coordinate)]
    origin: Coordinate,

    /// End point as "lat,lng"
    #[arg(long, value_parser = parse_coordinate, conflicts_with = "destination_place")]
    destination: Option<Coordinate>,

    /// End point as a Google place id
    #[arg(long, required_unless_present = "destination")]
    destination_place: Option<String>,

    /// Only ask for the best route
    #[arg(long)]
    no_alternatives: bool,

    /// Select this route before starting
    #[arg(long)]
    select: Option<usize>,

    /// Print the trip start payload
    #[arg(long)]
    start: bool,
}

/// A device that always knows where it is.
struct FixedLocation(Coordinate);

impl LocationProvider for FixedLocation {
    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn current_position(&self) -> PlannerResult<Coordinate> {
        Ok(self.0)
    }
}

/// Prints scenes to stdout.
struct TextSurface;

impl MapSurface for TextSurface {
    fn render(&mut self, scene: &MapScene) {
        println!(
            "Region: {:.5},{:.5} (span {:.3} x {:.3})",
            scene.region.center.latitude,
            scene.region.center.longitude,
            scene.region.latitude_delta,
            scene.region.longitude_delta
        );
        for marker in &scene.markers {
            println!(
                "  Marker {:<22} {:.5},{:.5}",
                marker.title, marker.coordinate.latitude, marker.coordinate.longitude
            );
        }
        if let Some(distance) = &scene.distance_label {
            println!("  Straight-line distance: {}", distance);
        }
        for path in &scene.paths {
            let label = scene
                .labels
                .iter()
                .find(|label| label.index == path.index)
                .map(|label| label.text.as_str())
                .unwrap_or("");
            println!(
                "  Route #{} {} {:>5} points {}{}",
                path.index,
                path.color,
                path.points.len(),
                label,
                if path.selected { " [selected]" } else { "" }
            );
        }
    }

    fn show_message(&mut self, message: &str) {
        println!("{}", message);
    }
}

fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {:?}", value))?;
    let latitude: f64 = lat.trim().parse().map_err(|_| format!("bad latitude {:?}", lat))?;
    let longitude: f64 = lng.trim().parse().map_err(|_| format!("bad longitude {:?}", lng))?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("{} is out of range", value));
    }
    Ok(Coordinate::new(latitude, longitude))
}

fn run(cli: Cli) -> PlannerResult<()> {
    let config = GoogleMapsConfig::from_env()?;
    let client = GoogleMapsClient::new(config)?;

    let options = ScreenOptions {
        alternatives: !cli.no_alternatives,
        start_mode: StartMode::Tap,
        ..ScreenOptions::default()
    };
    let mut session = TripSession::new(options, FixedLocation(cli.origin), client.clone(), client);
    session.mount();

    match (cli.destination, cli.destination_place) {
        (Some(destination), _) => session.choose_destination(destination),
        (None, Some(place_id)) => {
            session.choose_destination_place(&place_id)?;
        }
        (None, None) => return Err(PlannerError::Config("no destination given".to_string())),
    }

    if session.planner().routes().is_empty() {
        println!("No routes found.");
    }
    if let Some(index) = cli.select {
        session.tap_route(index);
    }

    session.render(&mut TextSurface);

    if cli.start {
        match session.start_trip() {
            Some(start) => println!("{}", serde_json::to_string_pretty(&start)?),
            None => println!("Trip cannot start yet."),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "plan-trip failed");
            ExitCode::FAILURE
        }
    }
}
