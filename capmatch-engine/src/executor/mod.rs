//! Execution strategies for the per-block and per-candidate stages
//!
//! Both stages are order-preserving maps over independent items, so every
//! strategy yields identical output.

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
pub mod parallel;
pub mod sequential;

#[cfg(feature = "parallel")]
pub use parallel::ParallelExecutor;
pub use sequential::SequentialExecutor;

/// Execution mode selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Single-threaded processing
    Sequential,
    /// Multi-threaded processing on rayon
    Parallel,
    /// Pick sequential or parallel from the block count
    #[default]
    Adaptive,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::Adaptive => "adaptive",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecutionMode::Sequential),
            "parallel" => Ok(ExecutionMode::Parallel),
            "adaptive" | "auto" => Ok(ExecutionMode::Adaptive),
            other => Err(format!("unknown execution mode '{other}'")),
        }
    }
}

/// Strategy for running an order-preserving map over a stage's items
pub trait Executor: Send + Sync {
    /// Apply `f` to every `(position, item)` and collect the results in
    /// input order.
    fn map_ordered<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &T) -> U + Sync + Send;

    /// Get the execution mode
    fn mode(&self) -> ExecutionMode;
}

/// Resolve the concrete mode for a document of `block_count` blocks
pub fn auto_select(block_count: usize, threshold: usize) -> ExecutionMode {
    if block_count < threshold {
        ExecutionMode::Sequential
    } else {
        #[cfg(feature = "parallel")]
        return ExecutionMode::Parallel;

        #[cfg(not(feature = "parallel"))]
        ExecutionMode::Sequential
    }
}
