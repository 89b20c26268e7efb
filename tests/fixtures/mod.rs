//! Test fixtures for route-optimizer.
//!
//! Provides realistic test data: real Las Vegas / Henderson locations
//! (from OpenStreetMap) and tour builders on top of them.

#![allow(dead_code)]

pub mod las_vegas_locations;

pub use las_vegas_locations::*;
