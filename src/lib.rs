//! route-optimizer
//!
//! Minimum-travel-time ordering of waypoints between a fixed start and end,
//! with travel times fetched pairwise from a routing provider.

pub mod builder;
pub mod cache;
pub mod error;
pub mod haversine;
pub mod location;
pub mod matrix;
pub mod optimizer;
pub mod osrm;
pub mod polyline;
pub mod retry;
pub mod solver;
pub mod traits;

pub use builder::{AbortHandle, BuildOptions, MatrixBuilder};
pub use cache::{CacheConfig, TimeMatrixCache};
pub use error::{ErrorReport, OptimizeError, RoutingError};
pub use haversine::HaversineRouter;
pub use location::Location;
pub use matrix::TimeMatrix;
pub use optimizer::{Method, OptimizeOptions, RouteOptimizer, RouteResult, MAX_LOCATIONS};
pub use osrm::{OsrmClient, OsrmConfig};
pub use polyline::Polyline;
pub use retry::RetryPolicy;
pub use solver::ExactMethod;
pub use traits::{ProgressObserver, RouteLeg, RoutingProvider};
