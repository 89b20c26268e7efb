//! Depth-first branch-and-bound search.
//!
//! A branch is dropped as soon as its accumulated cost reaches the best
//! complete route found so far, or when a lower bound on any completion does.
//! The bound adds to the accumulated cost:
//!
//! - the cheapest edge from the current node into the unvisited set,
//! - a minimum spanning tree over the unvisited set (Prim),
//! - the cheapest edge from the unvisited set to the end node.
//!
//! Any completion enters the unvisited set once, threads a Hamiltonian path
//! through it (itself a spanning tree) and leaves it once for the end, so the
//! bound never exceeds the true completion cost. With nothing left to visit
//! the bound is the closing edge to the end.

use std::time::Instant;

use tracing::debug;

use crate::matrix::TimeMatrix;

use super::{valid_endpoints, SearchStats, Solution};

pub fn solve(matrix: &TimeMatrix, start: usize, end: usize) -> Option<Solution> {
    if !valid_endpoints(matrix, start, end) {
        return None;
    }

    let started = Instant::now();
    let size = matrix.len();
    let mut visited = vec![false; size];
    visited[start] = true;

    let mut search = Search {
        matrix,
        end,
        visited,
        route: vec![start],
        best_cost: f64::INFINITY,
        best_route: None,
        nodes_explored: 0,
    };
    search.explore(start, 0.0, size - 2);

    let elapsed = started.elapsed();
    debug!(
        nodes_explored = search.nodes_explored,
        ?elapsed,
        cost = search.best_cost,
        "branch-and-bound finished"
    );

    let mut route = search.best_route?;
    route.push(end);
    Some(Solution {
        route,
        total_cost: search.best_cost,
        stats: SearchStats {
            nodes_explored: search.nodes_explored,
            elapsed,
        },
    })
}

struct Search<'a> {
    matrix: &'a TimeMatrix,
    end: usize,
    visited: Vec<bool>,
    /// Partial route from the start, without the end node.
    route: Vec<usize>,
    best_cost: f64,
    best_route: Option<Vec<usize>>,
    nodes_explored: u64,
}

impl Search<'_> {
    fn explore(&mut self, current: usize, cost: f64, remaining: usize) {
        self.nodes_explored += 1;

        if cost >= self.best_cost {
            return;
        }

        if remaining == 0 {
            let total = cost + self.matrix.time(current, self.end);
            if total < self.best_cost {
                self.best_cost = total;
                self.best_route = Some(self.route.clone());
            }
            return;
        }

        let unvisited = self.unvisited();
        if self.lower_bound(current, cost, &unvisited) >= self.best_cost {
            return;
        }

        let mut candidates = unvisited;
        candidates.sort_by(|&a, &b| {
            self.matrix
                .time(current, a)
                .total_cmp(&self.matrix.time(current, b))
                .then(a.cmp(&b))
        });

        for next in candidates {
            let edge = self.matrix.time(current, next);
            if !edge.is_finite() {
                // sorted ascending: everything after is unreachable too
                break;
            }
            self.visited[next] = true;
            self.route.push(next);
            self.explore(next, cost + edge, remaining - 1);
            self.route.pop();
            self.visited[next] = false;
        }
    }

    /// Nodes still to visit, excluding the end node.
    fn unvisited(&self) -> Vec<usize> {
        (0..self.matrix.len())
            .filter(|&node| !self.visited[node] && node != self.end)
            .collect()
    }

    fn lower_bound(&self, current: usize, cost: f64, unvisited: &[usize]) -> f64 {
        if unvisited.is_empty() {
            return cost + self.matrix.time(current, self.end);
        }

        let enter = min_edge(unvisited.iter().map(|&node| self.matrix.time(current, node)));
        let leave = min_edge(unvisited.iter().map(|&node| self.matrix.time(node, self.end)));
        cost + enter + mst_cost(self.matrix, unvisited) + leave
    }
}

fn min_edge(edges: impl Iterator<Item = f64>) -> f64 {
    edges.fold(f64::INFINITY, f64::min)
}

/// Prim's algorithm restricted to `nodes`; infinite when they are not
/// connected by finite edges. Each edge weighs the cheaper of its two
/// directions.
pub fn mst_cost(matrix: &TimeMatrix, nodes: &[usize]) -> f64 {
    let Some((&first, rest)) = nodes.split_first() else {
        return 0.0;
    };
    let weight = |a: usize, b: usize| matrix.time(a, b).min(matrix.time(b, a));

    let mut outside: Vec<usize> = rest.to_vec();
    let mut link: Vec<f64> = outside.iter().map(|&node| weight(first, node)).collect();
    let mut total = 0.0;

    while !outside.is_empty() {
        let mut pick = 0;
        for candidate in 1..link.len() {
            if link[candidate] < link[pick] {
                pick = candidate;
            }
        }
        let cheapest = link.swap_remove(pick);
        let added = outside.swap_remove(pick);
        if !cheapest.is_finite() {
            return f64::INFINITY;
        }
        total += cheapest;
        for (slot, &node) in outside.iter().enumerate() {
            link[slot] = link[slot].min(weight(added, node));
        }
    }

    total
}
