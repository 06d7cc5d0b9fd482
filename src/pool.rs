//! Bounded worker pool for per-file operations.
//!
//! The engine opens a fresh pool per (root directory x stage) and drops it
//! once drained, so pool identity never lives in shared global state and a
//! fault in one root cannot leak threads into the next. Operations run with
//! no ordering guarantee and must handle their own per-file errors.

use rayon::prelude::*;

/// Error building the underlying thread pool.
#[derive(Debug, thiserror::Error)]
#[error("failed to build worker pool: {0}")]
pub struct PoolError(#[from] rayon::ThreadPoolBuildError);

/// Bounded concurrent executor scoped to one root's file stream.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with exactly `workers` threads (clamped to at least 1).
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of threads in this pool.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` for every item of `items`, concurrently, and drain fully.
    ///
    /// Returns only after every dispatched operation has completed. Items are
    /// pulled lazily from the iterator and completions are unordered.
    pub fn run_each<T, I, F>(&self, items: I, op: F)
    where
        T: Send,
        I: IntoIterator<Item = T> + Send,
        I::IntoIter: Send,
        F: Fn(T) + Send + Sync,
    {
        self.pool
            .install(|| items.into_iter().par_bridge().for_each(op));
    }
}
