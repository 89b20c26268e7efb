//! Core traits for the route optimizer.
//!
//! These are intentionally minimal. Concrete apps plug in their own routing
//! backend and progress sink.

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::error::RoutingError;
use crate::polyline::Polyline;

/// Answer of a routing provider for one ordered pair of coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// Travel time in seconds.
    pub total_time: f64,
    /// Travel distance in metres, when the provider reports one.
    pub total_distance: Option<f64>,
    /// Road geometry from the origin to the destination.
    pub path: Polyline,
    pub segment_times: Vec<f64>,
    pub segment_distances: Vec<f64>,
}

impl RouteLeg {
    /// Rejects negative or non-finite totals.
    pub fn validated(self) -> Result<Self, RoutingError> {
        if !self.total_time.is_finite() || self.total_time < 0.0 {
            return Err(RoutingError::Malformed {
                message: format!("invalid total time {}", self.total_time),
            });
        }
        if let Some(distance) = self.total_distance {
            if !distance.is_finite() || distance < 0.0 {
                return Err(RoutingError::Malformed {
                    message: format!("invalid total distance {}", distance),
                });
            }
        }
        Ok(self)
    }
}

/// Computes a route between two coordinates (lat, lng).
///
/// Called concurrently from the matrix builder's worker threads, hence `Sync`.
pub trait RoutingProvider: Sync {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Result<RouteLeg, RoutingError>;
}

impl<P> RoutingProvider for &P
where
    P: RoutingProvider + ?Sized,
{
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Result<RouteLeg, RoutingError> {
        (**self).route(from, to)
    }
}

/// Receives (completed, total) progress updates.
///
/// During a matrix build updates arrive in order on a dedicated thread, so a
/// slow observer delays only later updates, never the routing batches.
pub trait ProgressObserver: Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Forwards a progress update, swallowing observer panics.
pub(crate) fn notify_progress(observer: Option<&dyn ProgressObserver>, completed: usize, total: usize) {
    let Some(observer) = observer else {
        return;
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.on_progress(completed, total)));
    if outcome.is_err() {
        warn!(completed, total, "progress observer panicked; ignoring");
    }
}
