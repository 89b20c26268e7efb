//! Locations handed to the optimizer.

use serde::{Deserialize, Serialize};

/// A named location with WGS84 coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    /// Coordinates as a (lat, lng) tuple.
    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Both coordinates finite and inside the WGS84 ranges.
    pub fn has_valid_coordinates(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Canonical text form of a coordinate, shared by cache fingerprints.
pub(crate) fn location_key(location: (f64, f64)) -> String {
    format!("{:.6},{:.6}", location.0, location.1)
}
