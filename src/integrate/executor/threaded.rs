//! Multi-threaded executor built on rayon.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{ParallelExecutor, segment_bounds};
use crate::integrate::error::{IntegrateError, IntegrateResult};

/// Default minimum number of items handed to one rayon task.
const DEFAULT_MIN_LEN: usize = 64;

/// Work-stealing executor.
///
/// Uses rayon's global pool unless built with [`Threaded::with_threads`].
/// Cloning shares the dedicated pool.
#[derive(Clone)]
pub struct Threaded {
    pool: Option<Arc<ThreadPool>>,
    min_len: usize,
}

impl Threaded {
    /// Executor on rayon's global thread pool.
    pub fn new() -> Self {
        Self {
            pool: None,
            min_len: DEFAULT_MIN_LEN,
        }
    }

    /// Executor on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> IntegrateResult<Self> {
        if threads == 0 {
            return Err(IntegrateError::invalid_parameter(
                "threads",
                "must be at least 1",
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("quadrs-worker-{}", i))
            .build()
            .map_err(|e| IntegrateError::invalid_parameter("threads", e.to_string()))?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
            min_len: DEFAULT_MIN_LEN,
        })
    }

    /// Set the minimum number of items per rayon task (at least 1).
    pub fn min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len.max(1);
        self
    }

    /// Number of worker threads this executor schedules onto.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for Threaded {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Threaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Threaded")
            .field("threads", &self.num_threads())
            .field("dedicated_pool", &self.pool.is_some())
            .field("min_len", &self.min_len)
            .finish()
    }
}

impl ParallelExecutor for Threaded {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        let min_len = self.min_len;
        self.install(|| items.par_iter().with_min_len(min_len).map(f).collect())
    }

    fn try_map<T, U, E, F>(&self, items: &[T], f: F) -> Result<Vec<U>, E>
    where
        T: Sync,
        U: Send,
        E: Send,
        F: Fn(&T) -> Result<U, E> + Sync + Send,
    {
        let min_len = self.min_len;
        self.install(|| items.par_iter().with_min_len(min_len).map(f).collect())
    }

    fn group_by_key<T, K, F>(&self, mut items: Vec<T>, key: F) -> Vec<T>
    where
        T: Send,
        K: Ord,
        F: Fn(&T) -> K + Sync + Send,
    {
        // par_sort_by_key is a stable merge sort
        self.install(|| items.par_sort_by_key(key));
        items
    }

    fn segmented_reduce<K, V, F>(&self, keys: &[K], values: &[V], op: F) -> Vec<(K, V)>
    where
        K: PartialEq + Copy + Send + Sync,
        V: Copy + Send + Sync,
        F: Fn(V, V) -> V + Sync + Send,
    {
        assert_eq!(keys.len(), values.len(), "segmented_reduce: length mismatch");
        let bounds = segment_bounds(keys);
        self.install(|| {
            bounds
                .par_iter()
                .map(|range| {
                    let first = values[range.start];
                    let reduced = values[range.start + 1..range.end]
                        .iter()
                        .fold(first, |acc, &v| op(acc, v));
                    (keys[range.start], reduced)
                })
                .collect()
        })
    }
}
