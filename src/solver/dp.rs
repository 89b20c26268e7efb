//! Bitmask dynamic programming over visited sets.
//!
//! `dp[mask][pos]` is the cheapest way to start at `start`, visit exactly the
//! nodes in `mask` and stand at `pos`. The end node may only be entered as the
//! final step. Memory is `2^n * n`, so the solver refuses instances above
//! [`MAX_NODES`].

use std::time::Instant;

use crate::matrix::TimeMatrix;

use super::{valid_endpoints, SearchStats, Solution};

pub const MAX_NODES: usize = 20;

const NO_PARENT: usize = usize::MAX;

pub fn solve(matrix: &TimeMatrix, start: usize, end: usize) -> Option<Solution> {
    let size = matrix.len();
    if !valid_endpoints(matrix, start, end) || size > MAX_NODES {
        return None;
    }

    let started = Instant::now();
    let full = (1usize << size) - 1;
    let end_bit = 1usize << end;
    let states = 1usize << size;
    let mut cost = vec![f64::INFINITY; states * size];
    let mut parent = vec![NO_PARENT; states * size];
    let mut relaxed = 0u64;

    cost[(1 << start) * size + start] = 0.0;

    for mask in 0..states {
        if mask & (1 << start) == 0 || (mask & end_bit != 0 && mask != full) {
            continue;
        }
        for pos in 0..size {
            let here = cost[mask * size + pos];
            if !here.is_finite() {
                continue;
            }
            for next in 0..size {
                let bit = 1usize << next;
                if mask & bit != 0 {
                    continue;
                }
                let next_mask = mask | bit;
                if next == end && next_mask != full {
                    continue;
                }
                let candidate = here + matrix.time(pos, next);
                let slot = next_mask * size + next;
                relaxed += 1;
                if candidate < cost[slot] {
                    cost[slot] = candidate;
                    parent[slot] = pos;
                }
            }
        }
    }

    let total_cost = cost[full * size + end];
    if !total_cost.is_finite() {
        return None;
    }

    let mut route = Vec::with_capacity(size);
    let mut mask = full;
    let mut pos = end;
    loop {
        route.push(pos);
        if pos == start && mask == 1 << start {
            break;
        }
        let previous = parent[mask * size + pos];
        if previous == NO_PARENT {
            return None;
        }
        mask &= !(1 << pos);
        pos = previous;
    }
    route.reverse();

    Some(Solution {
        route,
        total_cost,
        stats: SearchStats {
            nodes_explored: relaxed,
            elapsed: started.elapsed(),
        },
    })
}
