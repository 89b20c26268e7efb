//! Pairwise travel-time matrix.
//!
//! Values are seconds; unreachable pairs are `f64::INFINITY`. Matrices built
//! from routing calls are symmetric: one call per unordered pair fills both
//! directions. Each pair also keeps the provider's distance and geometry so a
//! finished route can be assembled without further calls.

use crate::polyline::Polyline;
use crate::traits::RouteLeg;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeMatrix {
    size: usize,
    times: Vec<f64>,
    distances: Vec<Option<f64>>,
    /// Geometry for `i -> j`, stored at `i * size + j` with `i < j` only.
    paths: Vec<Option<Polyline>>,
}

impl TimeMatrix {
    /// Zero diagonal, every other pair unreachable.
    pub fn new(size: usize) -> Self {
        let mut times = vec![f64::INFINITY; size * size];
        let mut distances = vec![None; size * size];
        for i in 0..size {
            times[i * size + i] = 0.0;
            distances[i * size + i] = Some(0.0);
        }
        Self {
            size,
            times,
            distances,
            paths: vec![None; size * size],
        }
    }

    /// Builds a matrix from explicit rows of travel times.
    ///
    /// Returns `None` unless the rows form a square matrix with a zero
    /// diagonal and non-negative entries elsewhere. `f64::INFINITY` marks an
    /// unreachable pair; NaN is rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        let valid = rows.iter().enumerate().all(|(i, row)| {
            row.iter()
                .enumerate()
                .all(|(j, &time)| if i == j { time == 0.0 } else { time >= 0.0 })
        });
        if !valid {
            return None;
        }
        let mut matrix = Self::new(size);
        matrix.times = rows.into_iter().flatten().collect();
        matrix.distances = vec![None; size * size];
        Some(matrix)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Travel time from `from` to `to` in seconds.
    pub fn time(&self, from: usize, to: usize) -> f64 {
        self.times[from * self.size + to]
    }

    /// Travel distance in metres, when known.
    pub fn distance(&self, from: usize, to: usize) -> Option<f64> {
        self.distances[from * self.size + to]
    }

    /// Geometry of the leg `from -> to`, reversed from the stored direction
    /// when needed.
    pub fn path(&self, from: usize, to: usize) -> Option<Polyline> {
        if from < to {
            self.paths[from * self.size + to].clone()
        } else {
            self.paths[to * self.size + from]
                .as_ref()
                .map(Polyline::reversed)
        }
    }

    /// Records the answer for the pair in both directions.
    pub fn set_pair(&mut self, i: usize, j: usize, leg: &RouteLeg) {
        let (lo, hi, path) = if i < j {
            (i, j, leg.path.clone())
        } else {
            (j, i, leg.path.reversed())
        };
        self.times[lo * self.size + hi] = leg.total_time;
        self.times[hi * self.size + lo] = leg.total_time;
        self.distances[lo * self.size + hi] = leg.total_distance;
        self.distances[hi * self.size + lo] = leg.total_distance;
        self.paths[lo * self.size + hi] = Some(path);
    }

    /// Marks the pair unreachable in both directions.
    pub fn set_unreachable(&mut self, i: usize, j: usize) {
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        self.times[lo * self.size + hi] = f64::INFINITY;
        self.times[hi * self.size + lo] = f64::INFINITY;
        self.distances[lo * self.size + hi] = None;
        self.distances[hi * self.size + lo] = None;
        self.paths[lo * self.size + hi] = None;
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (0..i).all(|j| self.time(i, j) == self.time(j, i)))
    }

    /// Number of unordered pairs with no finite travel time.
    pub fn unreachable_pairs(&self) -> usize {
        (0..self.size)
            .map(|i| (i + 1..self.size).filter(|&j| !self.time(i, j).is_finite()).count())
            .sum()
    }

    /// A copy where new index `k` refers to old index `order[k]`.
    ///
    /// `order` must be a permutation of `0..len()`.
    pub fn reindexed(&self, order: &[usize]) -> Self {
        let size = order.len();
        let mut matrix = Self::new(size);
        for (a, &old_a) in order.iter().enumerate() {
            for (b, &old_b) in order.iter().enumerate() {
                matrix.times[a * size + b] = self.time(old_a, old_b);
                matrix.distances[a * size + b] = self.distance(old_a, old_b);
                if a < b {
                    matrix.paths[a * size + b] = self.path(old_a, old_b);
                }
            }
        }
        matrix
    }

    /// Rows of travel times, mostly for logging and tests.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.times.chunks(self.size.max(1)).map(<[f64]>::to_vec).collect()
    }
}
