//! Caption recognition and context pairing algorithms
//!
//! This crate holds the pure, I/O-free stages of the pairing pipeline:
//!
//! 1. [`PatternSet`]: data-driven caption and cross-reference recognizers
//! 2. [`CandidateBuilder`]: per-block caption candidates
//! 3. [`Deduplicator`]: one winner per physical caption
//! 4. [`ContextAssociator`]: window and cross-reference context
//! 5. [`ConfidenceScorer`]: confidence from three weighted signals
//!
//! Orchestration, configuration and parallel execution live in
//! `capmatch-engine`.

#![warn(missing_docs)]

pub mod candidate;
pub mod context;
pub mod dedup;
pub mod error;
pub mod patterns;
pub mod scoring;
pub mod types;

pub use candidate::{check_span, CandidateBuilder, DEFAULT_MAX_LABEL_LENGTH, EMPTY_LABEL_FACTOR};
pub use context::{BlockScan, ContextAssociator, DocumentIndex, DEFAULT_WINDOW_RADIUS};
pub use dedup::{Deduplicator, DEFAULT_DEDUP_DISTANCE};
pub use error::{CandidateFault, ContextError, PatternError};
pub use patterns::{CaptionRule, KindHint, Mention, PatternSet, ReferenceRule};
pub use scoring::{
    completeness_signal, position_signal, specificity_signal, ConfidenceScorer, ScoreWeights,
    DEFAULT_POSITIONAL_PENALTY,
};
pub use types::{
    number_key, BlockRef, BoundingBox, CaptionCandidate, CaptionContextPair, ContextBundle, Kind,
    Span, TextBlock,
};
