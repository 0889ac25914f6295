//! Single-threaded executor.

use super::{ParallelExecutor, segment_bounds};

/// Runs every primitive on the caller's thread, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequential;

impl ParallelExecutor for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        items.iter().map(f).collect()
    }

    fn try_map<T, U, E, F>(&self, items: &[T], f: F) -> Result<Vec<U>, E>
    where
        T: Sync,
        U: Send,
        E: Send,
        F: Fn(&T) -> Result<U, E> + Sync + Send,
    {
        items.iter().map(f).collect()
    }

    fn group_by_key<T, K, F>(&self, mut items: Vec<T>, key: F) -> Vec<T>
    where
        T: Send,
        K: Ord,
        F: Fn(&T) -> K + Sync + Send,
    {
        items.sort_by_key(key);
        items
    }

    fn segmented_reduce<K, V, F>(&self, keys: &[K], values: &[V], op: F) -> Vec<(K, V)>
    where
        K: PartialEq + Copy + Send + Sync,
        V: Copy + Send + Sync,
        F: Fn(V, V) -> V + Sync + Send,
    {
        assert_eq!(keys.len(), values.len(), "segmented_reduce: length mismatch");
        segment_bounds(keys)
            .into_iter()
            .map(|range| {
                let key = keys[range.start];
                let first = values[range.start];
                let reduced = values[range.start + 1..range.end]
                    .iter()
                    .fold(first, |acc, &v| op(acc, v));
                (key, reduced)
            })
            .collect()
    }
}
