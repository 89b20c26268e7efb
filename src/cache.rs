//! Time-to-live cache of travel-time matrices.
//!
//! Keys are fingerprints of the coordinate set, independent of order, so a
//! reordered list of the same locations reuses the cached matrix. Entries are
//! `Arc`-shared and replaced wholesale; a reader never observes a partially
//! written matrix.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::location::location_key;
use crate::matrix::TimeMatrix;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Maximum number of entries; the oldest insertion is evicted first.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    /// Coordinate order the matrix is indexed by.
    coords: Arc<Vec<(f64, f64)>>,
    matrix: Arc<TimeMatrix>,
    created_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    insertion_order: VecDeque<String>,
}

impl CacheState {
    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.insertion_order.retain(|existing| existing != key);
    }
}

/// Shared, thread-safe matrix cache. Wrap in an `Arc` to share between
/// optimizers.
#[derive(Debug, Default)]
pub struct TimeMatrixCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

/// Order-independent key for a set of coordinates.
pub fn fingerprint(coords: &[(f64, f64)]) -> String {
    let mut keys: Vec<String> = coords.iter().map(|&coord| location_key(coord)).collect();
    keys.sort();
    keys.join(";")
}

impl TimeMatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Entries are only ever swapped whole, so a poisoned lock still
        // guards consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Matrix for `coords`, indexed in the order given.
    ///
    /// Expired entries are removed and reported as a miss.
    pub fn get(&self, coords: &[(f64, f64)]) -> Option<TimeMatrix> {
        let key = fingerprint(coords);
        let (cached_coords, matrix) = {
            let mut state = self.lock();
            let expired = match state.entries.get(&key) {
                None => return None,
                Some(entry) => entry.created_at.elapsed() >= self.config.ttl,
            };
            if expired {
                debug!(key = %key, "time matrix cache entry expired");
                state.remove(&key);
                return None;
            }
            let entry = state.entries.get(&key)?;
            (Arc::clone(&entry.coords), Arc::clone(&entry.matrix))
        };

        let order = match_order(coords, &cached_coords)?;
        if order.iter().enumerate().all(|(k, &old)| k == old) {
            Some(TimeMatrix::clone(&matrix))
        } else {
            Some(matrix.reindexed(&order))
        }
    }

    /// Stores `matrix`, indexed in the order of `coords`.
    pub fn put(&self, coords: &[(f64, f64)], matrix: TimeMatrix) {
        if self.config.capacity == 0 {
            return;
        }
        let key = fingerprint(coords);
        let entry = CacheEntry {
            coords: Arc::new(coords.to_vec()),
            matrix: Arc::new(matrix),
            created_at: Instant::now(),
        };

        let mut state = self.lock();
        if state.entries.contains_key(&key) {
            state.remove(&key);
        }
        while state.entries.len() >= self.config.capacity {
            let Some(oldest) = state.insertion_order.pop_front() else {
                break;
            };
            debug!(key = %oldest, "evicting time matrix cache entry");
            state.entries.remove(&oldest);
        }
        state.insertion_order.push_back(key.clone());
        state.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.insertion_order.clear();
    }
}

/// For each requested coordinate, the index of the same coordinate in the
/// cached order. Duplicate coordinates are matched first-come first-served.
fn match_order(requested: &[(f64, f64)], cached: &[(f64, f64)]) -> Option<Vec<usize>> {
    if requested.len() != cached.len() {
        return None;
    }
    let mut available: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (index, &coord) in cached.iter().enumerate() {
        available.entry(location_key(coord)).or_default().push_back(index);
    }
    requested
        .iter()
        .map(|&coord| available.get_mut(&location_key(coord))?.pop_front())
        .collect()
}
