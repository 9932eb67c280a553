//! Engine error types

use capmatch_core::{ContextError, PatternError};
use thiserror::Error;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A candidate's block reference does not resolve to its source block
    #[error("malformed block reference: position {position} (page {page}, index {index})")]
    MalformedBlockReference {
        /// Position in the input sequence
        position: usize,
        /// Expected page
        page: u32,
        /// Expected index
        index: u32,
    },

    /// The rule table could not be loaded
    #[error("pattern error: {0}")]
    Patterns(#[from] PatternError),

    /// The dedicated thread pool could not be created
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

impl From<ContextError> for EngineError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::MalformedBlockReference {
                position,
                page,
                index,
            } => EngineError::MalformedBlockReference {
                position,
                page,
                index,
            },
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
