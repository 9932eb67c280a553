//! Public API for capmatch caption-context pairing
//!
//! This crate provides a stable interface that reads document blocks from
//! text, JSON or files, runs the engine and returns serializable output.

#![warn(missing_docs)]

pub mod config;
pub mod dto;
pub mod error;

use std::path::Path;
use std::time::Instant;

use dto::Metadata;
use error::Result;

// Re-export key types
pub use capmatch_core::patterns::{list_builtin, DEFAULT_SET};
pub use capmatch_engine::{ExecutionMode, Kind, PatternSet, TextBlock, DEFAULT_PARALLEL_THRESHOLD};
pub use config::{Config, ConfigBuilder, PatternSource};
pub use dto::{BlockDTO, CaptionDTO, Input, Output, PairDTO, StatsDTO};
pub use error::ApiError;

/// Main entry point for caption-context pairing
///
/// Wraps the engine processor and turns its result into [`Output`] DTOs
/// with timing metadata.
#[derive(Debug)]
pub struct PairingProcessor {
    inner: capmatch_engine::PairingProcessor,
    config: Config,
}

impl PairingProcessor {
    /// Create a processor with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a processor with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let inner = config::engine_processor(&config)?;
        Ok(Self { inner, config })
    }

    /// Process input with the configured execution mode
    pub fn process(&self, input: Input) -> Result<Output> {
        self.process_with_mode(input, self.config.execution_mode())
    }

    /// Process input with an explicit execution mode
    pub fn process_with_mode(&self, input: Input, mode: ExecutionMode) -> Result<Output> {
        let blocks = input.read_blocks()?;
        self.run(&blocks, mode)
    }

    /// Process already extracted blocks
    pub fn process_blocks(&self, blocks: &[TextBlock]) -> Result<Output> {
        self.run(blocks, self.config.execution_mode())
    }

    /// Process plain text
    pub fn process_text(&self, text: &str) -> Result<Output> {
        self.process(Input::from_text(text))
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn run(&self, blocks: &[TextBlock], mode: ExecutionMode) -> Result<Output> {
        let start = Instant::now();
        let mode_used = match mode {
            ExecutionMode::Adaptive => self.inner.select_mode(blocks.len()),
            mode => mode,
        };
        let result = self.inner.process_with_mode(blocks, mode_used)?;

        let metadata = Metadata {
            processing_time_ms: start.elapsed().as_millis() as u64,
            mode_used: mode_used.to_string(),
            thread_count: self.inner.thread_count(mode_used),
            patterns: self.inner.patterns().name().to_string(),
        };
        Ok(Output::from_result(&result, metadata))
    }
}

// Convenience functions

/// Pair blocks with the default configuration
pub fn process_blocks(blocks: &[TextBlock]) -> Result<Output> {
    PairingProcessor::new()?.process_blocks(blocks)
}

/// Pair plain text with the default configuration
pub fn process_text(text: &str) -> Result<Output> {
    PairingProcessor::new()?.process(Input::from_text(text))
}

/// Pair a JSON array of blocks with the default configuration
pub fn process_json(json: &str) -> Result<Output> {
    PairingProcessor::new()?.process(Input::from_json(json))
}

/// Pair a file with the default configuration
pub fn process_file<P: AsRef<Path>>(path: P) -> Result<Output> {
    PairingProcessor::new()?.process(Input::from_file(path.as_ref()))
}
