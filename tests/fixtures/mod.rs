//! Test fixtures for trip-planner.
//!
//! Provides:
//! - Named San Francisco locations
//! - Directions / Place Details payloads shaped like the Google APIs return

#![allow(dead_code)]

pub mod san_francisco;

pub use san_francisco::*;
