//! Route optimizer: validates the location list, fetches the travel-time
//! matrix and runs the solver that fits the instance size.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::builder::{AbortHandle, BuildOptions, MatrixBuilder};
use crate::cache::TimeMatrixCache;
use crate::error::OptimizeError;
use crate::location::Location;
use crate::matrix::TimeMatrix;
use crate::polyline::Polyline;
use crate::solver::{ExactMethod, Solution, SolverKind};
use crate::traits::{ProgressObserver, RouteLeg, RoutingProvider};

/// Start, waypoints and end combined.
pub const MAX_LOCATIONS: usize = 12;

#[derive(Debug, Clone, Default)]
pub struct OptimizeOptions {
    /// Solver for the 4..=10 waypoint band.
    pub exact_method: ExactMethod,
    pub build: BuildOptions,
}

/// How the visiting order was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// No waypoints: one call from start to end.
    Direct,
    BruteForce,
    BranchAndBound,
    BitmaskDp,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Direct => "direct",
            Method::BruteForce => SolverKind::BruteForce.name(),
            Method::BranchAndBound => SolverKind::BranchAndBound.name(),
            Method::BitmaskDp => SolverKind::BitmaskDp.name(),
        }
    }
}

impl From<SolverKind> for Method {
    fn from(kind: SolverKind) -> Self {
        match kind {
            SolverKind::BruteForce => Method::BruteForce,
            SolverKind::BranchAndBound => Method::BranchAndBound,
            SolverKind::BitmaskDp => Method::BitmaskDp,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeStats {
    /// Outbound routing calls, retries included.
    pub routing_calls: usize,
    pub cache_hit: bool,
    /// Branch-and-bound nodes visited.
    pub nodes_explored: Option<u64>,
    pub search_time: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    /// Indices into the input list, start first and end last.
    pub order: Vec<usize>,
    /// Seconds.
    pub total_time: f64,
    /// Metres; only when the provider reported a distance for every leg.
    pub total_distance: Option<f64>,
    pub path: Polyline,
    pub segment_times: Vec<f64>,
    pub segment_distances: Option<Vec<f64>>,
    pub method: Method,
    pub stats: OptimizeStats,
}

/// Checks the location list before any routing call is made.
pub fn validate_locations(locations: &[Location]) -> Result<(), OptimizeError> {
    if locations.len() > MAX_LOCATIONS {
        return Err(OptimizeError::TooManyLocations {
            max: MAX_LOCATIONS,
            current: locations.len(),
        });
    }
    if locations.len() < 2 {
        return Err(OptimizeError::TooFewLocations {
            current: locations.len(),
        });
    }
    if let Some((index, location)) = locations
        .iter()
        .enumerate()
        .find(|(_, location)| !location.has_valid_coordinates())
    {
        return Err(OptimizeError::InvalidCoordinate {
            index,
            lat: location.lat,
            lng: location.lng,
        });
    }
    Ok(())
}

/// Finds the fastest order for a list of locations with fixed endpoints.
///
/// The cache is injected so several optimizers (or tests) can share one, or
/// keep their own. The routing worker pool is started on first use and kept
/// for the optimizer's lifetime.
#[derive(Debug)]
pub struct RouteOptimizer<P> {
    provider: P,
    cache: Arc<TimeMatrixCache>,
    options: OptimizeOptions,
    builder: OnceLock<MatrixBuilder>,
}

impl<P: RoutingProvider> RouteOptimizer<P> {
    pub fn new(provider: P, cache: Arc<TimeMatrixCache>) -> Self {
        Self::with_options(provider, cache, OptimizeOptions::default())
    }

    pub fn with_options(provider: P, cache: Arc<TimeMatrixCache>, options: OptimizeOptions) -> Self {
        Self {
            provider,
            cache,
            options,
            builder: OnceLock::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &Arc<TimeMatrixCache> {
        &self.cache
    }

    pub fn options(&self) -> &OptimizeOptions {
        &self.options
    }

    fn matrix_builder(&self) -> Result<&MatrixBuilder, OptimizeError> {
        if let Some(builder) = self.builder.get() {
            return Ok(builder);
        }
        let builder = MatrixBuilder::new(self.options.build.clone())?;
        Ok(self.builder.get_or_init(|| builder))
    }

    /// Optimizes the visiting order of `locations[1..n-1]`.
    ///
    /// `observer` receives (pairs routed, pairs total) after every batch of
    /// the matrix build.
    pub fn optimize(
        &self,
        locations: &[Location],
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<RouteResult, OptimizeError> {
        self.optimize_with_abort(locations, observer, &AbortHandle::new())
    }

    /// Like [`RouteOptimizer::optimize`], but stops issuing routing batches
    /// once `abort` fires.
    pub fn optimize_with_abort(
        &self,
        locations: &[Location],
        observer: Option<&dyn ProgressObserver>,
        abort: &AbortHandle,
    ) -> Result<RouteResult, OptimizeError> {
        validate_locations(locations)?;

        let waypoints = locations.len() - 2;
        if waypoints == 0 {
            return self.direct_route(locations, abort);
        }

        let kind = SolverKind::for_waypoints(waypoints, self.options.exact_method).ok_or(
            OptimizeError::TooManyLocations {
                max: MAX_LOCATIONS,
                current: locations.len(),
            },
        )?;

        let coords: Vec<(f64, f64)> = locations.iter().map(Location::coords).collect();
        let built = self
            .matrix_builder()?
            .build(&coords, &self.provider, &self.cache, observer, abort)?;

        let end = locations.len() - 1;
        let solution = kind
            .solve(&built.matrix, 0, end, None)
            .ok_or(OptimizeError::NoRouteFound)?;

        let stats = OptimizeStats {
            routing_calls: built.routing_calls,
            cache_hit: built.cache_hit,
            nodes_explored: (kind == SolverKind::BranchAndBound).then_some(solution.stats.nodes_explored),
            search_time: solution.stats.elapsed,
        };
        info!(
            method = kind.name(),
            locations = locations.len(),
            calls = stats.routing_calls,
            cache_hit = stats.cache_hit,
            nodes_explored = solution.stats.nodes_explored,
            total_time = solution.total_cost,
            "route optimized"
        );

        Ok(assemble(&built.matrix, solution, kind.into(), stats))
    }

    fn direct_route(&self, locations: &[Location], abort: &AbortHandle) -> Result<RouteResult, OptimizeError> {
        if abort.is_aborted() {
            return Err(OptimizeError::Aborted);
        }

        let started = Instant::now();
        let calls = AtomicUsize::new(0);
        let from = locations[0].coords();
        let to = locations[1].coords();
        let leg = self.options.build.retry.run(|| {
            calls.fetch_add(1, Ordering::Relaxed);
            self.provider.route(from, to).and_then(RouteLeg::validated)
        })?;

        let stats = OptimizeStats {
            routing_calls: calls.load(Ordering::Relaxed),
            cache_hit: false,
            nodes_explored: None,
            search_time: started.elapsed(),
        };
        info!(method = "direct", calls = stats.routing_calls, total_time = leg.total_time, "route optimized");

        Ok(RouteResult {
            order: vec![0, 1],
            total_time: leg.total_time,
            total_distance: leg.total_distance,
            segment_times: vec![leg.total_time],
            segment_distances: leg.total_distance.map(|distance| vec![distance]),
            path: leg.path,
            method: Method::Direct,
            stats,
        })
    }
}

/// Builds the result from the winning order using matrix lookups only.
fn assemble(matrix: &TimeMatrix, solution: Solution, method: Method, stats: OptimizeStats) -> RouteResult {
    let legs: Vec<(usize, usize)> = solution
        .route
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();

    let segment_times: Vec<f64> = legs.iter().map(|&(from, to)| matrix.time(from, to)).collect();
    let segment_distances: Option<Vec<f64>> = legs
        .iter()
        .map(|&(from, to)| matrix.distance(from, to))
        .collect();
    let total_distance = segment_distances.as_ref().map(|distances| distances.iter().sum());

    let leg_paths: Vec<Polyline> = legs
        .iter()
        .filter_map(|&(from, to)| matrix.path(from, to))
        .collect();
    let path = Polyline::concat(&leg_paths);
    debug!(points = path.len(), legs = legs.len(), "route geometry assembled");

    RouteResult {
        order: solution.route,
        total_time: solution.total_cost,
        total_distance,
        path,
        segment_times,
        segment_distances,
        method,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineRouter;

    fn strip(count: usize) -> Vec<Location> {
        (0..count)
            .map(|i| Location::new(format!("stop {i}"), 36.10 + i as f64 * 0.005, -115.17))
            .collect()
    }

    #[test]
    fn test_validate_rejects_thirteen_locations() {
        let err = validate_locations(&strip(13)).expect_err("too many");
        assert_eq!(err, OptimizeError::TooManyLocations { max: 12, current: 13 });
    }

    #[test]
    fn test_validate_rejects_single_location() {
        let err = validate_locations(&strip(1)).expect_err("too few");
        assert_eq!(err, OptimizeError::TooFewLocations { current: 1 });
    }

    #[test]
    fn test_validate_rejects_bad_coordinate() {
        let mut locations = strip(3);
        locations[1].lat = f64::NAN;
        match validate_locations(&locations) {
            Err(OptimizeError::InvalidCoordinate { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected invalid coordinate, got {other:?}"),
        }
    }

    #[test]
    fn test_worker_pool_created_once() {
        let optimizer = RouteOptimizer::new(HaversineRouter::default(), Arc::new(TimeMatrixCache::new()));
        assert!(optimizer.builder.get().is_none());

        optimizer.optimize(&strip(4), None).expect("first run");
        let first: *const MatrixBuilder = optimizer.matrix_builder().expect("builder");
        optimizer.optimize(&strip(5), None).expect("second run");
        let second: *const MatrixBuilder = optimizer.matrix_builder().expect("builder");

        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_direct_route_needs_no_worker_pool() {
        let optimizer = RouteOptimizer::new(HaversineRouter::default(), Arc::new(TimeMatrixCache::new()));
        optimizer.optimize(&strip(2), None).expect("direct");
        assert!(optimizer.builder.get().is_none());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Direct.name(), "direct");
        assert_eq!(Method::from(SolverKind::BranchAndBound).name(), "branch-and-bound");
    }

    #[test]
    fn test_assemble_uses_matrix_lookups() {
        let mut matrix = TimeMatrix::new(3);
        let router = HaversineRouter::default();
        let coords: Vec<(f64, f64)> = strip(3).iter().map(Location::coords).collect();
        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            let leg = router.route(coords[i], coords[j]).expect("route");
            matrix.set_pair(i, j, &leg);
        }
        let solution = Solution {
            route: vec![0, 1, 2],
            total_cost: matrix.time(0, 1) + matrix.time(1, 2),
            stats: Default::default(),
        };

        let result = assemble(&matrix, solution, Method::BruteForce, OptimizeStats::default());
        assert_eq!(result.segment_times, vec![matrix.time(0, 1), matrix.time(1, 2)]);
        let distances = result.segment_distances.expect("haversine reports distances");
        assert_eq!(distances.len(), 2);
        assert_eq!(result.total_distance, Some(distances[0] + distances[1]));
        assert_eq!(result.path.points(), &[coords[0], coords[1], coords[2]]);
    }

    #[test]
    fn test_assemble_without_distances() {
        let matrix = TimeMatrix::from_rows(vec![vec![0.0, 5.0], vec![5.0, 0.0]]).expect("square");
        let solution = Solution {
            route: vec![0, 1],
            total_cost: 5.0,
            stats: Default::default(),
        };
        let result = assemble(&matrix, solution, Method::BruteForce, OptimizeStats::default());
        assert_eq!(result.total_distance, None);
        assert_eq!(result.segment_distances, None);
        assert!(result.path.is_empty());
    }
}
