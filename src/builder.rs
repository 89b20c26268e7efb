//! Travel-time matrix builder.
//!
//! Issues one two-point routing call per unordered pair of locations, in
//! fixed-size batches. Calls within a batch run concurrently on a dedicated
//! thread pool; batches run one after another with a short pause between
//! them. A pair whose call fails for good is recorded as unreachable and the
//! build carries on. Matrices with pairs lost to transient errors (timeouts,
//! 5xx) are returned but not cached, so the next run asks again.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::TimeMatrixCache;
use crate::error::{OptimizeError, RoutingError};
use crate::matrix::TimeMatrix;
use crate::retry::RetryPolicy;
use crate::traits::{notify_progress, ProgressObserver, RouteLeg, RoutingProvider};

pub const DEFAULT_BATCH_SIZE: usize = 16;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Routing calls dispatched together.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Caller-side switch to stop a build between batches.
///
/// Calls already in flight finish (or time out) on their own.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct BuiltMatrix {
    pub matrix: TimeMatrix,
    /// Outbound routing calls made, retries included.
    pub routing_calls: usize,
    pub cache_hit: bool,
}

/// Every unordered pair `(i, j)` with `i < j`.
pub fn location_pairs(count: usize) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|i| (i + 1..count).map(move |j| (i, j)))
        .collect()
}

/// Builds travel-time matrices on a worker pool sized to the batch.
///
/// The pool is created once and reused for every build.
#[derive(Debug)]
pub struct MatrixBuilder {
    options: BuildOptions,
    pool: rayon::ThreadPool,
}

impl MatrixBuilder {
    pub fn new(options: BuildOptions) -> Result<Self, OptimizeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.batch_size.max(1))
            .thread_name(|index| format!("route-matrix-{index}"))
            .build()
            .map_err(|err| OptimizeError::WorkerPool {
                message: err.to_string(),
            })?;
        Ok(Self { options, pool })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Returns the matrix for `coords`, from the cache or by routing every
    /// pair.
    ///
    /// Fails only when every pairwise call fails, when aborted, or when a
    /// worker thread cannot start. Progress is handed to `observer` on a
    /// separate thread, so a slow observer never holds up the next batch.
    pub fn build<P>(
        &self,
        coords: &[(f64, f64)],
        provider: &P,
        cache: &TimeMatrixCache,
        observer: Option<&dyn ProgressObserver>,
        abort: &AbortHandle,
    ) -> Result<BuiltMatrix, OptimizeError>
    where
        P: RoutingProvider + ?Sized,
    {
        if let Some(matrix) = cache.get(coords) {
            debug!(locations = coords.len(), "time matrix cache hit");
            return Ok(BuiltMatrix {
                matrix,
                routing_calls: 0,
                cache_hit: true,
            });
        }

        thread::scope(|scope| {
            let progress = match observer {
                Some(observer) => {
                    let (sender, receiver) = mpsc::channel::<(usize, usize)>();
                    thread::Builder::new()
                        .name("route-progress".to_string())
                        .spawn_scoped(scope, move || {
                            for (completed, total) in receiver {
                                notify_progress(Some(observer), completed, total);
                            }
                        })
                        .map_err(|err| OptimizeError::WorkerPool {
                            message: err.to_string(),
                        })?;
                    Some(sender)
                }
                None => None,
            };
            self.route_pairs(coords, provider, cache, progress.as_ref(), abort)
        })
    }

    fn route_pairs<P>(
        &self,
        coords: &[(f64, f64)],
        provider: &P,
        cache: &TimeMatrixCache,
        progress: Option<&Sender<(usize, usize)>>,
        abort: &AbortHandle,
    ) -> Result<BuiltMatrix, OptimizeError>
    where
        P: RoutingProvider + ?Sized,
    {
        let pairs = location_pairs(coords.len());
        let total = pairs.len();
        let batch_size = self.options.batch_size.max(1);
        let retry = &self.options.retry;

        let calls = AtomicUsize::new(0);
        let mut matrix = TimeMatrix::new(coords.len());
        let mut completed = 0;
        let mut failed = 0;
        let mut transient = 0;

        for (batch_index, batch) in pairs.chunks(batch_size).enumerate() {
            if batch_index > 0 && !self.options.batch_delay.is_zero() {
                thread::sleep(self.options.batch_delay);
            }
            if abort.is_aborted() {
                warn!(completed, total, "time matrix build aborted");
                return Err(OptimizeError::Aborted);
            }

            let results: Vec<((usize, usize), Result<RouteLeg, RoutingError>)> = self.pool.install(|| {
                batch
                    .par_iter()
                    .with_max_len(1)
                    .map(|&(i, j)| {
                        let result = retry.run(|| {
                            calls.fetch_add(1, Ordering::Relaxed);
                            provider.route(coords[i], coords[j]).and_then(RouteLeg::validated)
                        });
                        ((i, j), result)
                    })
                    .collect()
            });

            for ((i, j), result) in results {
                match result {
                    Ok(leg) => matrix.set_pair(i, j, &leg),
                    Err(err) => {
                        warn!(from = i, to = j, error = %err, "routing call failed; pair marked unreachable");
                        matrix.set_unreachable(i, j);
                        failed += 1;
                        if err.is_retryable() {
                            transient += 1;
                        }
                    }
                }
            }

            completed += batch.len();
            debug!(batch = batch_index, completed, total, "time matrix batch finished");
            if let Some(progress) = progress {
                // the receiver only goes away if the progress thread died
                let _ = progress.send((completed, total));
            }
        }

        let routing_calls = calls.load(Ordering::Relaxed);
        if total > 0 && failed == total {
            return Err(OptimizeError::RoutingUnavailable {
                calls: routing_calls,
            });
        }

        info!(
            locations = coords.len(),
            pairs = total,
            unreachable = failed,
            calls = routing_calls,
            "time matrix built"
        );
        if transient == 0 {
            cache.put(coords, matrix.clone());
        } else {
            debug!(transient, "time matrix not cached; some pairs ran out of retries");
        }

        Ok(BuiltMatrix {
            matrix,
            routing_calls,
            cache_hit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineRouter;
    use std::sync::Mutex;
    use std::time::Instant;

    fn fast_options() -> BuildOptions {
        BuildOptions {
            batch_size: 4,
            batch_delay: Duration::ZERO,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::ZERO,
            },
        }
    }

    fn builder() -> MatrixBuilder {
        MatrixBuilder::new(fast_options()).expect("worker pool")
    }

    fn coords(count: usize) -> Vec<(f64, f64)> {
        (0..count)
            .map(|i| (36.0 + i as f64 * 0.01, -115.0 - i as f64 * 0.01))
            .collect()
    }

    /// Fails every call touching `bad` with the given HTTP status.
    struct RejectingRouter {
        bad: (f64, f64),
        status: u16,
    }

    impl RoutingProvider for RejectingRouter {
        fn route(&self, from: (f64, f64), to: (f64, f64)) -> Result<RouteLeg, RoutingError> {
            if from == self.bad || to == self.bad {
                return Err(RoutingError::Http {
                    status: self.status,
                    message: "rejected".to_string(),
                });
            }
            HaversineRouter::default().route(from, to)
        }
    }

    #[test]
    fn test_location_pairs() {
        assert_eq!(location_pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(location_pairs(12).len(), 66);
        assert!(location_pairs(1).is_empty());
    }

    #[test]
    fn test_builds_symmetric_matrix() {
        let cache = TimeMatrixCache::new();
        let built = builder().build(
            &coords(6),
            &HaversineRouter::default(),
            &cache,
            None,
            &AbortHandle::new(),
        )
        .expect("build");

        assert!(!built.cache_hit);
        assert_eq!(built.routing_calls, 15);
        assert!(built.matrix.is_symmetric());
        assert_eq!(built.matrix.unreachable_pairs(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_progress_reported_per_batch() {
        let events = Mutex::new(Vec::new());
        let observer = |completed: usize, total: usize| {
            events.lock().expect("events lock").push((completed, total));
        };
        builder().build(
            &coords(5),
            &HaversineRouter::default(),
            &TimeMatrixCache::new(),
            Some(&observer),
            &AbortHandle::new(),
        )
        .expect("build");

        let events = events.into_inner().expect("events");
        assert_eq!(events, vec![(4, 10), (8, 10), (10, 10)]);
    }

    #[test]
    fn test_failed_pairs_become_unreachable() {
        let locations = coords(4);
        let router = RejectingRouter {
            bad: locations[3],
            status: 400,
        };
        let built = builder().build(
            &locations,
            &router,
            &TimeMatrixCache::new(),
            None,
            &AbortHandle::new(),
        )
        .expect("partial failure should not abort the build");

        assert_eq!(built.matrix.unreachable_pairs(), 3);
        assert_eq!(built.matrix.time(0, 3), f64::INFINITY);
        assert_eq!(built.matrix.time(3, 1), f64::INFINITY);
        // client errors are not retried
        assert_eq!(built.routing_calls, 6);
    }

    #[test]
    fn test_all_failures_is_an_error() {
        let locations = coords(2);
        let router = RejectingRouter {
            bad: locations[0],
            status: 400,
        };
        let cache = TimeMatrixCache::new();
        let err = builder().build(
            &locations,
            &router,
            &cache,
            None,
            &AbortHandle::new(),
        )
        .expect_err("every call failed");

        assert_eq!(err, OptimizeError::RoutingUnavailable { calls: 1 });
        assert!(cache.is_empty());
    }

    #[test]
    fn test_aborted_build_issues_no_calls() {
        let abort = AbortHandle::new();
        abort.abort();
        let cache = TimeMatrixCache::new();
        let err = builder().build(
            &coords(3),
            &HaversineRouter::default(),
            &cache,
            None,
            &abort,
        )
        .expect_err("aborted");

        assert_eq!(err, OptimizeError::Aborted);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_permanent_failures_are_cached() {
        let locations = coords(4);
        let router = RejectingRouter {
            bad: locations[3],
            status: 404,
        };
        let cache = TimeMatrixCache::new();
        builder()
            .build(&locations, &router, &cache, None, &AbortHandle::new())
            .expect("build");

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_transient_failures_are_not_cached() {
        let locations = coords(4);
        let router = RejectingRouter {
            bad: locations[3],
            status: 503,
        };
        let cache = TimeMatrixCache::new();
        let built = builder()
            .build(&locations, &router, &cache, None, &AbortHandle::new())
            .expect("build");

        assert_eq!(built.matrix.unreachable_pairs(), 3);
        assert_eq!(built.routing_calls, 3 + 3 * 3);
        assert!(cache.is_empty());

        let again = builder()
            .build(&locations, &router, &cache, None, &AbortHandle::new())
            .expect("rebuild");
        assert!(!again.cache_hit);
    }

    /// Records when each call starts.
    struct ClockedRouter {
        starts: Mutex<Vec<Instant>>,
    }

    impl RoutingProvider for ClockedRouter {
        fn route(&self, from: (f64, f64), to: (f64, f64)) -> Result<RouteLeg, RoutingError> {
            self.starts.lock().expect("starts lock").push(Instant::now());
            HaversineRouter::default().route(from, to)
        }
    }

    #[test]
    fn test_slow_observer_does_not_hold_up_batches() {
        let builder = MatrixBuilder::new(BuildOptions {
            batch_size: 1,
            ..fast_options()
        })
        .expect("worker pool");
        let router = ClockedRouter {
            starts: Mutex::new(Vec::new()),
        };
        let events = Mutex::new(Vec::new());
        let observer = |completed: usize, total: usize| {
            thread::sleep(Duration::from_millis(200));
            events.lock().expect("events lock").push((completed, total));
        };

        builder
            .build(&coords(3), &router, &TimeMatrixCache::new(), Some(&observer), &AbortHandle::new())
            .expect("build");

        let starts = router.starts.into_inner().expect("starts");
        assert_eq!(starts.len(), 3);
        assert!(starts[2].duration_since(starts[0]) < Duration::from_millis(200));
        // every update is still delivered, in order, before build returns
        assert_eq!(events.into_inner().expect("events"), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_builder_reuses_pool_across_builds() {
        let builder = builder();
        let cache = TimeMatrixCache::with_config(crate::cache::CacheConfig {
            ttl: Duration::ZERO,
            capacity: 10,
        });
        for _ in 0..3 {
            let built = builder
                .build(&coords(4), &HaversineRouter::default(), &cache, None, &AbortHandle::new())
                .expect("build");
            assert!(!built.cache_hit);
        }
        assert_eq!(builder.pool.current_num_threads(), 4);
    }
}
