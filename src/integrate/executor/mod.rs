//! Execution backends for the data-parallel steps of the integrators.
//!
//! The adaptive quadrature engine and the VEGAS integrator never loop over
//! their work lists directly. They hand them to a [`ParallelExecutor`], which
//! provides the three primitives the algorithms need:
//!
//! - [`map`](ParallelExecutor::map) / [`try_map`](ParallelExecutor::try_map):
//!   element-wise evaluation of independent work items
//! - [`group_by_key`](ParallelExecutor::group_by_key): stable reordering so
//!   that items sharing a key become contiguous
//! - [`segmented_reduce`](ParallelExecutor::segmented_reduce): reduction of
//!   contiguous runs of equal keys
//!
//! Every call returns only once all work has finished, so callers never
//! observe partially reduced data.
//!
//! | Executor | Scheduling |
//! |----------|------------|
//! | [`Sequential`] | caller's thread, in order |
//! | [`Threaded`] | rayon work stealing, global or dedicated pool |
//!
//! Tensor runtimes (CPU/CUDA/WebGPU through numr) are driven through
//! [`AdaptiveQuadratureAlgorithms`](crate::integrate::AdaptiveQuadratureAlgorithms)
//! instead, since their integrands operate on whole tensors.

mod sequential;
mod threaded;

use std::ops::Range;

pub use sequential::Sequential;
pub use threaded::Threaded;

/// Data-parallel primitives required by the integrators.
pub trait ParallelExecutor: Send + Sync {
    /// Short backend name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Apply `f` to every item, preserving order.
    fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send;

    /// Apply a fallible `f` to every item, preserving order.
    ///
    /// Returns one of the errors if any item fails; which one is unspecified
    /// for parallel executors.
    fn try_map<T, U, E, F>(&self, items: &[T], f: F) -> Result<Vec<U>, E>
    where
        T: Sync,
        U: Send,
        E: Send,
        F: Fn(&T) -> Result<U, E> + Sync + Send;

    /// Stable reorder of `items` so equal keys are contiguous and ascending.
    fn group_by_key<T, K, F>(&self, items: Vec<T>, key: F) -> Vec<T>
    where
        T: Send,
        K: Ord,
        F: Fn(&T) -> K + Sync + Send;

    /// Reduce each run of equal consecutive keys with `op`.
    ///
    /// Returns one `(key, reduced)` pair per run, in input order.
    ///
    /// # Panics
    ///
    /// Panics if `keys` and `values` differ in length.
    fn segmented_reduce<K, V, F>(&self, keys: &[K], values: &[V], op: F) -> Vec<(K, V)>
    where
        K: PartialEq + Copy + Send + Sync,
        V: Copy + Send + Sync,
        F: Fn(V, V) -> V + Sync + Send;
}

/// Index ranges of the runs of equal consecutive keys.
pub(crate) fn segment_bounds<K: PartialEq>(keys: &[K]) -> Vec<Range<usize>> {
    let mut bounds = Vec::new();
    let mut start = 0;
    for i in 1..=keys.len() {
        if i == keys.len() || keys[i] != keys[start] {
            bounds.push(start..i);
            start = i;
        }
    }
    bounds
}
