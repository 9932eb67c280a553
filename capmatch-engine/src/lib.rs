//! Application orchestration for caption-context pairing
//!
//! This crate provides configuration and validation, execution strategies
//! and the [`PairingProcessor`] that drives the stages of `capmatch-core`.

#![warn(missing_docs)]

pub mod assembler;
pub mod config;
pub mod error;
pub mod executor;
pub mod processor;

// Re-export key types
pub use assembler::{CandidateOutcome, PairingResult, PairingStats, ResultAssembler};
pub use config::{EngineConfig, DEFAULT_PARALLEL_THRESHOLD};
pub use error::{EngineError, Result};
pub use executor::{auto_select, ExecutionMode, Executor};
pub use processor::{PairingProcessor, PairingProcessorBuilder};

// Re-export from core for convenience
pub use capmatch_core::{
    BlockRef, BoundingBox, CaptionCandidate, CaptionContextPair, ContextBundle, Kind, PatternSet,
    ScoreWeights, TextBlock,
};
