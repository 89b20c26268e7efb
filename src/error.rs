//! Error types for routing calls and optimization runs.

use serde::Serialize;
use thiserror::Error;

/// Failure of a single routing-provider call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    /// The request did not complete within the client timeout.
    #[error("routing request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
    /// The provider answered with a non-success HTTP status.
    #[error("routing provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Connection-level failure (DNS, refused, reset).
    #[error("routing provider unreachable: {message}")]
    Network { message: String },
    /// The provider understood the request but refused to route it.
    #[error("routing service error {code}: {message}")]
    Service { code: String, message: String },
    /// The response could not be parsed or carried unusable totals.
    #[error("malformed routing response: {message}")]
    Malformed { message: String },
}

impl RoutingError {
    /// Whether repeating the same request could succeed.
    ///
    /// 4xx statuses and explicit service refusals are permanent for the pair.
    pub fn is_retryable(&self) -> bool {
        match self {
            RoutingError::Timeout { .. }
            | RoutingError::Network { .. }
            | RoutingError::Malformed { .. } => true,
            RoutingError::Http { status, .. } => !(400..500).contains(status),
            RoutingError::Service { .. } => false,
        }
    }
}

/// Failure of a whole optimization run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("too many locations: {current} given, at most {max} supported")]
    TooManyLocations { max: usize, current: usize },
    #[error("at least 2 locations are required, {current} given")]
    TooFewLocations { current: usize },
    #[error("location {index} has an invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { index: usize, lat: f64, lng: f64 },
    #[error("no route visits every location with finite travel time")]
    NoRouteFound,
    #[error("all {calls} routing calls failed")]
    RoutingUnavailable { calls: usize },
    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),
    #[error("optimization aborted")]
    Aborted,
    #[error("failed to start routing workers: {message}")]
    WorkerPool { message: String },
}

impl OptimizeError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            OptimizeError::TooManyLocations { .. } => "TOO_MANY_LOCATIONS",
            OptimizeError::TooFewLocations { .. } => "TOO_FEW_LOCATIONS",
            OptimizeError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            OptimizeError::NoRouteFound => "NO_ROUTE_FOUND",
            OptimizeError::RoutingUnavailable { .. } => "ROUTING_UNAVAILABLE",
            OptimizeError::Routing(_) => "ROUTING_FAILED",
            OptimizeError::Aborted => "ABORTED",
            OptimizeError::WorkerPool { .. } => "INTERNAL",
        }
    }

    /// Input violations are detected before any routing call is issued.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            OptimizeError::TooManyLocations { .. }
                | OptimizeError::TooFewLocations { .. }
                | OptimizeError::InvalidCoordinate { .. }
        )
    }

    /// Structured form handed to the presentation layer.
    pub fn report(&self) -> ErrorReport {
        let mut report = ErrorReport {
            error: self.code(),
            message: self.to_string(),
            max_locations: None,
            current_locations: None,
            index: None,
        };
        match self {
            OptimizeError::TooManyLocations { max, current } => {
                report.max_locations = Some(*max);
                report.current_locations = Some(*current);
            }
            OptimizeError::TooFewLocations { current } => {
                report.current_locations = Some(*current);
            }
            OptimizeError::InvalidCoordinate { index, .. } => {
                report.index = Some(*index);
            }
            _ => {}
        }
        report
    }
}

/// Serialisable error payload, e.g.
/// `{"error":"TOO_MANY_LOCATIONS","message":"...","maxLocations":12,"currentLocations":13}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_locations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_locations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}
