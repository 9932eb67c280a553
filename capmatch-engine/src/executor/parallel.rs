//! Parallel execution strategy

use rayon::prelude::*;

use crate::{
    error::{EngineError, Result},
    executor::{ExecutionMode, Executor},
};

/// Parallel multi-threaded executor
///
/// Runs on the global rayon pool unless a thread count is given, in which
/// case a dedicated pool is built once and reused.
#[derive(Debug)]
pub struct ParallelExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl ParallelExecutor {
    /// Create a new parallel executor
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let pool = match threads {
            Some(count) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(count)
                    .thread_name(|i| format!("capmatch-{i}"))
                    .build()
                    .map_err(|e| EngineError::ThreadPool(e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self { pool })
    }

    /// Threads available to this executor
    pub fn thread_count(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |pool| pool.current_num_threads())
    }
}

impl Executor for ParallelExecutor {
    fn map_ordered<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &T) -> U + Sync + Send,
    {
        let run = || {
            items
                .par_iter()
                .enumerate()
                .map(|(position, item)| f(position, item))
                .collect::<Vec<U>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Parallel
    }
}
