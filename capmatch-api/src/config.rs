//! High-level configuration API

use std::path::PathBuf;

use capmatch_engine::{
    EngineConfig, ExecutionMode, PairingProcessorBuilder, PatternSet, ScoreWeights,
};

use crate::error::{ApiError, Result};

/// Where the caption rule table comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSource {
    /// A table embedded in the library, by name
    Builtin(String),
    /// A TOML table on disk
    File(PathBuf),
}

impl Default for PatternSource {
    fn default() -> Self {
        PatternSource::Builtin(capmatch_core::patterns::DEFAULT_SET.to_string())
    }
}

impl PatternSource {
    /// Load and compile the table
    pub fn load(&self) -> Result<PatternSet> {
        let set = match self {
            PatternSource::Builtin(name) => PatternSet::builtin(name)?,
            PatternSource::File(path) => PatternSet::from_file(path)?,
        };
        Ok(set)
    }
}

/// High-level configuration for caption pairing
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub(crate) engine: EngineConfig,
    pub(crate) patterns: PatternSource,
}

impl Config {
    /// Configuration tuned for precision
    pub fn precise() -> Self {
        Self {
            engine: EngineConfig::precise(),
            ..Self::default()
        }
    }

    /// Configuration tuned for recall
    pub fn recall() -> Self {
        Self {
            engine: EngineConfig::recall(),
            ..Self::default()
        }
    }

    /// Create a builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Engine settings
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Rule table source
    pub fn patterns(&self) -> &PatternSource {
        &self.patterns
    }

    /// Execution mode
    pub fn execution_mode(&self) -> ExecutionMode {
        self.engine.execution_mode
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from the precision preset
    pub fn precise(mut self) -> Self {
        self.config.engine = EngineConfig::precise();
        self
    }

    /// Start from the recall preset
    pub fn recall(mut self) -> Self {
        self.config.engine = EngineConfig::recall();
        self
    }

    /// Set the context window radius
    pub fn context_window_radius(mut self, radius: usize) -> Self {
        self.config.engine.context_window_radius = radius;
        self
    }

    /// Set the label cap in characters
    pub fn max_label_length(mut self, length: usize) -> Self {
        self.config.engine.max_label_length = length;
        self
    }

    /// Set the dedup distance in blocks
    pub fn dedup_block_distance(mut self, distance: usize) -> Self {
        self.config.engine.dedup_block_distance = distance;
        self
    }

    /// Set the confidence weights
    pub fn confidence_weights(mut self, specificity: f64, completeness: f64, position: f64) -> Self {
        self.config.engine.confidence_weights =
            ScoreWeights::new(specificity, completeness, position);
        self
    }

    /// Set the positional penalty
    pub fn positional_penalty(mut self, penalty: f64) -> Self {
        self.config.engine.positional_penalty = penalty;
        self
    }

    /// Set the confidence floor
    pub fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.config.engine.min_confidence = min_confidence;
        self
    }

    /// Emit figure pairs or not
    pub fn include_figures(mut self, include: bool) -> Self {
        self.config.engine.include_figures = include;
        self
    }

    /// Emit table pairs or not
    pub fn include_tables(mut self, include: bool) -> Self {
        self.config.engine.include_tables = include;
        self
    }

    /// Set the execution mode
    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.config.engine.execution_mode = mode;
        self
    }

    /// Set thread count
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.config.engine.threads = threads;
        self
    }

    /// Set the adaptive threshold in blocks
    pub fn parallel_threshold(mut self, blocks: usize) -> Self {
        self.config.engine.parallel_threshold = blocks;
        self
    }

    /// Use a built-in rule table
    pub fn patterns_builtin(mut self, name: impl Into<String>) -> Self {
        self.config.patterns = PatternSource::Builtin(name.into());
        self
    }

    /// Use a rule table file
    pub fn patterns_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.patterns = PatternSource::File(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        self.config
            .engine
            .validate()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(self.config)
    }

    /// Build a pairing processor directly
    pub fn build_processor(self) -> Result<crate::PairingProcessor> {
        crate::PairingProcessor::with_config(self.build()?)
    }
}

/// Build the engine processor for a configuration
pub(crate) fn engine_processor(config: &Config) -> Result<capmatch_engine::PairingProcessor> {
    let patterns = config.patterns.load()?;
    let processor = PairingProcessorBuilder::new()
        .config(config.engine.clone())
        .patterns(patterns)
        .build()?;
    Ok(processor)
}
