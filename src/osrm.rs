//! OSRM HTTP adapter for two-point routes.
//!
//! Each call hits the Route service with exactly two coordinates:
//! `{base_url}/route/v1/{profile}/{lng},{lat};{lng},{lat}?overview=full&geometries=geojson`.

use serde::Deserialize;

use crate::error::RoutingError;
use crate::polyline::Polyline;
use crate::traits::{RouteLeg, RoutingProvider};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    fn route_url(&self, from: (f64, f64), to: (f64, f64)) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            from.1,
            from.0,
            to.1,
            to.0
        )
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error) -> RoutingError {
        if error.is_timeout() {
            return RoutingError::Timeout {
                timeout_secs: self.config.timeout_secs,
            };
        }

        if let Some(status) = error.status() {
            return RoutingError::Http {
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        if error.is_decode() {
            return RoutingError::Malformed {
                message: error.to_string(),
            };
        }

        RoutingError::Network {
            message: error.to_string(),
        }
    }
}

impl RoutingProvider for OsrmClient {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Result<RouteLeg, RoutingError> {
        let url = self.route_url(from, to);

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| self.convert_reqwest_error(&err))?;

        let body = response
            .json::<OsrmRouteResponse>()
            .map_err(|err| self.convert_reqwest_error(&err))?;

        convert_response(body)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    duration: Option<f64>,
    distance: Option<f64>,
    geometry: Option<OsrmGeometry>,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: [lng, lat].
    coordinates: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    duration: f64,
    distance: f64,
}

fn convert_response(response: OsrmRouteResponse) -> Result<RouteLeg, RoutingError> {
    if response.code != "Ok" {
        return Err(RoutingError::Service {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Malformed {
            message: "OSRM response contains no routes".to_string(),
        })?;

    let total_time = route.duration.ok_or_else(|| RoutingError::Malformed {
        message: "OSRM route is missing a duration".to_string(),
    })?;

    let path = route
        .geometry
        .map(|geometry| {
            geometry
                .coordinates
                .into_iter()
                .map(|(lng, lat)| (lat, lng))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    RouteLeg {
        total_time,
        total_distance: route.distance,
        path: Polyline::new(path),
        segment_times: route.legs.iter().map(|leg| leg.duration).collect(),
        segment_distances: route.legs.iter().map(|leg| leg.distance).collect(),
    }
    .validated()
}
