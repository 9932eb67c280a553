//! Pairing processor and builder
//!
//! Runs the pipeline: scan blocks, flatten candidates, deduplicate,
//! associate context, score, then assemble the ordered result.

use std::sync::Arc;

use capmatch_core::{
    check_span, BlockScan, CandidateBuilder, CaptionCandidate, CaptionContextPair,
    ConfidenceScorer, ContextAssociator, ContextError, Deduplicator, DocumentIndex, PatternSet,
    ScoreWeights, TextBlock,
};

use crate::{
    assembler::{CandidateOutcome, PairingResult, ResultAssembler, ScanCounts},
    config::EngineConfig,
    error::Result,
    executor::{auto_select, ExecutionMode, Executor, SequentialExecutor},
};

#[cfg(feature = "parallel")]
use crate::executor::ParallelExecutor;

/// Main caption-context pairing processor
///
/// Configuration is validated once at construction; processing itself only
/// fails on a malformed block reference.
#[derive(Debug)]
pub struct PairingProcessor {
    config: EngineConfig,
    patterns: Arc<PatternSet>,
    sequential: SequentialExecutor,
    #[cfg(feature = "parallel")]
    parallel: ParallelExecutor,
}

impl PairingProcessor {
    /// Create a processor with the default configuration and rule table
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create a processor with custom configuration and the default table
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let patterns = PatternSet::default_set()?;
        Self::with_patterns(config, patterns)
    }

    /// Create a processor with custom configuration and rule table
    pub fn with_patterns(
        config: EngineConfig,
        patterns: impl Into<Arc<PatternSet>>,
    ) -> Result<Self> {
        config.validate()?;
        let patterns = patterns.into();
        patterns.validate()?;
        log::debug!(
            "pairing processor ready: table '{}' with {} caption rules, mode {}",
            patterns.name(),
            patterns.captions().len(),
            config.execution_mode
        );

        Ok(Self {
            #[cfg(feature = "parallel")]
            parallel: ParallelExecutor::new(config.threads)?,
            sequential: SequentialExecutor,
            config,
            patterns,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Active rule table
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Concrete mode the configured mode resolves to for `block_count` blocks
    pub fn select_mode(&self, block_count: usize) -> ExecutionMode {
        match self.config.execution_mode {
            ExecutionMode::Adaptive => auto_select(block_count, self.config.parallel_threshold),
            mode => mode,
        }
    }

    /// Worker threads a run in `mode` uses
    pub fn thread_count(&self, mode: ExecutionMode) -> usize {
        match mode {
            #[cfg(feature = "parallel")]
            ExecutionMode::Parallel => self.parallel.thread_count(),
            _ => 1,
        }
    }

    /// Pair captions with context using the configured execution mode
    pub fn process(&self, blocks: &[TextBlock]) -> Result<PairingResult> {
        self.process_with_mode(blocks, self.config.execution_mode)
    }

    /// Pair captions with context using a specific execution mode
    pub fn process_with_mode(
        &self,
        blocks: &[TextBlock],
        mode: ExecutionMode,
    ) -> Result<PairingResult> {
        let mode = match mode {
            ExecutionMode::Adaptive => auto_select(blocks.len(), self.config.parallel_threshold),
            mode => mode,
        };
        log::debug!("processing {} blocks ({mode})", blocks.len());

        match mode {
            #[cfg(feature = "parallel")]
            ExecutionMode::Parallel => self.run(blocks, &self.parallel),
            _ => self.run(blocks, &self.sequential),
        }
    }

    fn run<E: Executor>(&self, blocks: &[TextBlock], executor: &E) -> Result<PairingResult> {
        let patterns = self.patterns.as_ref();
        let config = &self.config;

        let builder =
            CandidateBuilder::new(patterns).with_max_label_length(config.max_label_length);
        let scans = executor.map_ordered(blocks, |position, block| {
            BlockScan::scan(&builder, patterns, position, block)
        });
        let index = DocumentIndex::from_scans(blocks, &scans);

        let raw: Vec<CaptionCandidate> = scans.into_iter().flat_map(|s| s.candidates).collect();
        let raw_count = raw.len();
        log::debug!("scan: {raw_count} raw candidates");

        let deduped = Deduplicator::new(config.dedup_block_distance).dedup(raw);
        log::debug!("dedup: {} candidates kept", deduped.len());

        let associator = ContextAssociator::new(&index, config.context_window_radius);
        let scorer = ConfidenceScorer::new(
            config.confidence_weights,
            config.positional_penalty,
            config.context_window_radius,
            patterns.max_specificity(),
            blocks.len(),
        );

        let outcomes = executor
            .map_ordered(&deduped, |_, candidate| {
                pair_candidate(candidate, &index, &associator, &scorer)
            })
            .into_iter()
            .collect::<std::result::Result<Vec<_>, ContextError>>()?;

        let counts = ScanCounts {
            blocks: blocks.len(),
            raw: raw_count,
            deduped: deduped.len(),
        };
        let result = ResultAssembler::new(config).assemble(counts, outcomes);
        log::debug!(
            "assembled {} pairs, average confidence {:.3}",
            result.pairs.len(),
            result.stats.average_confidence
        );
        Ok(result)
    }
}

/// Associate and score one candidate. Span faults drop the candidate; a
/// stale block reference aborts the run.
fn pair_candidate(
    candidate: &CaptionCandidate,
    index: &DocumentIndex<'_>,
    associator: &ContextAssociator<'_, '_>,
    scorer: &ConfidenceScorer,
) -> std::result::Result<CandidateOutcome, ContextError> {
    let block = index.resolve(&candidate.source_block)?;
    if let Err(fault) = check_span(candidate, block) {
        return Ok(CandidateOutcome::Dropped(fault));
    }

    let bundle = associator.associate(candidate)?;
    let confidence = scorer.score(&bundle);
    log::trace!(
        "{} {} at block {}: confidence {confidence:.3}",
        candidate.kind,
        candidate.number,
        candidate.position()
    );
    Ok(CandidateOutcome::Paired(CaptionContextPair { bundle, confidence }))
}

/// Builder for PairingProcessor
///
/// Provides a fluent interface for configuring the processor.
#[derive(Debug, Default)]
pub struct PairingProcessorBuilder {
    config: EngineConfig,
    patterns: Option<PatternSet>,
}

impl PairingProcessorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the context window radius
    pub fn context_window_radius(mut self, radius: usize) -> Self {
        self.config.context_window_radius = radius;
        self
    }

    /// Set the label cap
    pub fn max_label_length(mut self, length: usize) -> Self {
        self.config.max_label_length = length;
        self
    }

    /// Set the dedup distance
    pub fn dedup_block_distance(mut self, distance: usize) -> Self {
        self.config.dedup_block_distance = distance;
        self
    }

    /// Set the signal weights
    pub fn confidence_weights(
        mut self,
        specificity: f64,
        completeness: f64,
        position: f64,
    ) -> Self {
        self.config.confidence_weights = ScoreWeights::new(specificity, completeness, position);
        self
    }

    /// Set the positional penalty
    pub fn positional_penalty(mut self, penalty: f64) -> Self {
        self.config.positional_penalty = penalty;
        self
    }

    /// Set the confidence floor
    pub fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.config.min_confidence = min_confidence;
        self
    }

    /// Emit figure pairs or not
    pub fn include_figures(mut self, include: bool) -> Self {
        self.config.include_figures = include;
        self
    }

    /// Emit table pairs or not
    pub fn include_tables(mut self, include: bool) -> Self {
        self.config.include_tables = include;
        self
    }

    /// Set the execution mode
    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.config.execution_mode = mode;
        self
    }

    /// Set the thread count
    pub fn threads(mut self, count: Option<usize>) -> Self {
        self.config.threads = count;
        self
    }

    /// Set the adaptive parallel threshold in blocks
    pub fn parallel_threshold(mut self, blocks: usize) -> Self {
        self.config.parallel_threshold = blocks;
        self
    }

    /// Use a custom rule table
    pub fn patterns(mut self, patterns: PatternSet) -> Self {
        self.patterns = Some(patterns);
        self
    }

    /// Use the precision preset, keeping the execution settings
    pub fn precise(mut self) -> Self {
        self.config = EngineConfig {
            execution_mode: self.config.execution_mode,
            threads: self.config.threads,
            parallel_threshold: self.config.parallel_threshold,
            ..EngineConfig::precise()
        };
        self
    }

    /// Use the recall preset, keeping the execution settings
    pub fn recall(mut self) -> Self {
        self.config = EngineConfig {
            execution_mode: self.config.execution_mode,
            threads: self.config.threads,
            parallel_threshold: self.config.parallel_threshold,
            ..EngineConfig::recall()
        };
        self
    }

    /// Build the processor
    pub fn build(self) -> Result<PairingProcessor> {
        match self.patterns {
            Some(patterns) => PairingProcessor::with_patterns(self.config, patterns),
            None => PairingProcessor::with_config(self.config),
        }
    }
}
