//! Haversine routing provider (fallback when OSRM unavailable).
//!
//! Uses great-circle distance to estimate travel time.
//! Less accurate than OSRM (ignores roads) but always available.

use crate::error::RoutingError;
use crate::polyline::Polyline;
use crate::traits::{RouteLeg, RoutingProvider};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Straight-line routing provider.
///
/// Returns the great-circle distance and the time needed to cover it at an
/// assumed average speed. The geometry is the two endpoints.
#[derive(Debug, Clone)]
pub struct HaversineRouter {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineRouter {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineRouter {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Great-circle distance between two points in kilometers.
    pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Travel time in seconds for `km` at the configured speed.
    fn km_to_seconds(&self, km: f64) -> f64 {
        km / self.speed_kmh * 3600.0
    }
}

impl RoutingProvider for HaversineRouter {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Result<RouteLeg, RoutingError> {
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            return Err(RoutingError::Service {
                code: "InvalidSpeed".to_string(),
                message: format!("speed must be positive, got {} km/h", self.speed_kmh),
            });
        }

        let km = Self::haversine_km(from, to);
        let seconds = self.km_to_seconds(km);
        let metres = km * 1000.0;

        Ok(RouteLeg {
            total_time: seconds,
            total_distance: Some(metres),
            path: Polyline::new(vec![from, to]),
            segment_times: vec![seconds],
            segment_distances: vec![metres],
        })
    }
}
