//! Exact open-path TSP solvers.
//!
//! Every solver takes a complete travel-time matrix plus fixed start and end
//! indices and returns the cheapest route that starts at `start`, ends at
//! `end` and visits every other index exactly once. `None` means no such
//! route has a finite cost.

use std::time::Duration;

use serde::Serialize;

use crate::matrix::TimeMatrix;
use crate::traits::ProgressObserver;

pub mod branch_bound;
pub mod brute_force;
pub mod dp;

/// Largest waypoint count handled by brute force.
pub const BRUTE_FORCE_MAX_WAYPOINTS: usize = 3;

/// Largest waypoint count handled by the exact searches.
pub const EXACT_MAX_WAYPOINTS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Search-tree nodes (or DP states) visited.
    pub nodes_explored: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub route: Vec<usize>,
    pub total_cost: f64,
    pub stats: SearchStats,
}

/// Exact method used for the 4..=10 waypoint band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExactMethod {
    #[default]
    BranchAndBound,
    BitmaskDp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverKind {
    BruteForce,
    BranchAndBound,
    BitmaskDp,
}

impl SolverKind {
    /// Solver for `waypoints` reorderable stops, `None` outside 1..=10.
    pub fn for_waypoints(waypoints: usize, exact: ExactMethod) -> Option<Self> {
        match waypoints {
            1..=BRUTE_FORCE_MAX_WAYPOINTS => Some(SolverKind::BruteForce),
            4..=EXACT_MAX_WAYPOINTS => Some(match exact {
                ExactMethod::BranchAndBound => SolverKind::BranchAndBound,
                ExactMethod::BitmaskDp => SolverKind::BitmaskDp,
            }),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SolverKind::BruteForce => "brute-force",
            SolverKind::BranchAndBound => "branch-and-bound",
            SolverKind::BitmaskDp => "bitmask-dp",
        }
    }

    pub fn solve(
        self,
        matrix: &TimeMatrix,
        start: usize,
        end: usize,
        observer: Option<&dyn ProgressObserver>,
    ) -> Option<Solution> {
        match self {
            SolverKind::BruteForce => brute_force::solve_with_progress(matrix, start, end, observer),
            SolverKind::BranchAndBound => branch_bound::solve(matrix, start, end),
            SolverKind::BitmaskDp => dp::solve(matrix, start, end),
        }
    }
}

/// Sum of matrix edges along `route`.
pub fn route_cost(matrix: &TimeMatrix, route: &[usize]) -> f64 {
    route
        .windows(2)
        .map(|pair| matrix.time(pair[0], pair[1]))
        .sum()
}

/// Indices other than `start` and `end`, ascending.
pub(crate) fn waypoints(size: usize, start: usize, end: usize) -> Vec<usize> {
    (0..size).filter(|&i| i != start && i != end).collect()
}

/// Shared argument check: distinct, in-range endpoints.
pub(crate) fn valid_endpoints(matrix: &TimeMatrix, start: usize, end: usize) -> bool {
    start != end && start < matrix.len() && end < matrix.len()
}
