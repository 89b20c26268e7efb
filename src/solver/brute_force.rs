//! Exhaustive permutation search for small instances.

use std::time::Instant;

use crate::matrix::TimeMatrix;
use crate::traits::{notify_progress, ProgressObserver};

use super::{valid_endpoints, waypoints, SearchStats, Solution};

pub fn solve(matrix: &TimeMatrix, start: usize, end: usize) -> Option<Solution> {
    solve_with_progress(matrix, start, end, None)
}

/// Tries every waypoint order in lexicographic order; the first minimum wins.
///
/// Reports (permutations evaluated, total permutations) to `observer`.
pub fn solve_with_progress(
    matrix: &TimeMatrix,
    start: usize,
    end: usize,
    observer: Option<&dyn ProgressObserver>,
) -> Option<Solution> {
    if !valid_endpoints(matrix, start, end) {
        return None;
    }

    let started = Instant::now();
    let stops = waypoints(matrix.len(), start, end);
    let mut search = Permutations {
        matrix,
        start,
        end,
        observer,
        total: (1..=stops.len()).product(),
        evaluated: 0,
        best: None,
        order: Vec::with_capacity(stops.len()),
        used: vec![false; stops.len()],
        stops,
    };
    search.permute();

    let (order, total_cost) = search.best?;
    let mut route = Vec::with_capacity(matrix.len());
    route.push(start);
    route.extend(order);
    route.push(end);

    Some(Solution {
        route,
        total_cost,
        stats: SearchStats {
            nodes_explored: search.evaluated as u64,
            elapsed: started.elapsed(),
        },
    })
}

struct Permutations<'a> {
    matrix: &'a TimeMatrix,
    start: usize,
    end: usize,
    observer: Option<&'a dyn ProgressObserver>,
    stops: Vec<usize>,
    total: usize,
    evaluated: usize,
    best: Option<(Vec<usize>, f64)>,
    order: Vec<usize>,
    used: Vec<bool>,
}

impl Permutations<'_> {
    fn permute(&mut self) {
        if self.order.len() == self.stops.len() {
            self.evaluate();
            return;
        }
        for slot in 0..self.stops.len() {
            if self.used[slot] {
                continue;
            }
            self.used[slot] = true;
            self.order.push(self.stops[slot]);
            self.permute();
            self.order.pop();
            self.used[slot] = false;
        }
    }

    fn evaluate(&mut self) {
        let mut cost = 0.0;
        let mut previous = self.start;
        for &stop in self.order.iter().chain(std::iter::once(&self.end)) {
            cost += self.matrix.time(previous, stop);
            previous = stop;
        }

        self.evaluated += 1;
        notify_progress(self.observer, self.evaluated, self.total);

        if !cost.is_finite() {
            return;
        }
        let improved = match &self.best {
            Some((_, best_cost)) => cost < *best_cost,
            None => true,
        };
        if improved {
            self.best = Some((self.order.clone(), cost));
        }
    }
}
