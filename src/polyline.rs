//! Polyline representation for route geometries.
//!
//! Points are decoded (latitude, longitude) pairs. Encoding to a compact
//! wire format is the presentation layer's business.

use serde::{Deserialize, Serialize};

/// A route geometry as an ordered list of coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The same geometry travelled in the opposite direction.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Appends `next`, dropping its first point when it repeats our last one.
    pub fn append(&mut self, next: &Polyline) {
        let skip = match (self.points.last(), next.points.first()) {
            (Some(last), Some(first)) if last == first => 1,
            _ => 0,
        };
        self.points.extend(next.points.iter().skip(skip).copied());
    }

    /// Joins consecutive legs into one continuous geometry.
    pub fn concat<'a>(legs: impl IntoIterator<Item = &'a Polyline>) -> Self {
        let mut joined = Self::default();
        for leg in legs {
            joined.append(leg);
        }
        joined
    }
}
