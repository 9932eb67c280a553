//! Result assembly
//!
//! Collects the per-candidate outcomes of a run into the final, document
//! ordered [`PairingResult`] and its statistics.

use std::collections::{BTreeMap, BTreeSet};

use capmatch_core::{CandidateFault, CaptionContextPair, Kind};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Result of one candidate's association and scoring
#[derive(Debug, Clone)]
pub enum CandidateOutcome {
    /// The candidate was paired and scored
    Paired(CaptionContextPair),
    /// The candidate was dropped for a non-fatal fault
    Dropped(CandidateFault),
}

/// Aggregate statistics of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingStats {
    /// Blocks in the input
    pub total_blocks_scanned: usize,
    /// Candidates before deduplication
    pub total_candidates_raw: usize,
    /// Candidates after deduplication
    pub total_candidates_deduped: usize,
    /// Emitted pairs per kind
    pub counts_by_kind: BTreeMap<Kind, usize>,
    /// Cross-reference blocks across emitted pairs
    pub reference_count: usize,
    /// Mean confidence of emitted pairs, 0 when none
    pub average_confidence: f64,
    /// Lowest confidence of emitted pairs, 0 when none
    pub min_confidence: f64,
    /// Highest confidence of emitted pairs, 0 when none
    pub max_confidence: f64,
    /// Sorted pages holding emitted captions
    pub pages_covered: Vec<u32>,
    /// Candidates dropped for per-candidate faults
    pub dropped_candidates: usize,
    /// One message per dropped candidate
    pub diagnostics: Vec<String>,
    /// Pairs removed by the confidence floor
    pub filtered_low_confidence: usize,
    /// Pairs removed because their kind is excluded
    pub filtered_by_kind: usize,
}

/// Ordered pairs plus statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairingResult {
    /// Pairs in document order
    pub pairs: Vec<CaptionContextPair>,
    /// Aggregate statistics
    pub stats: PairingStats,
}

impl PairingResult {
    /// Number of emitted pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pair was emitted
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Counts gathered before association
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanCounts {
    /// Blocks in the input
    pub blocks: usize,
    /// Candidates before deduplication
    pub raw: usize,
    /// Candidates after deduplication
    pub deduped: usize,
}

/// Assembler applying the output filters and computing statistics
#[derive(Debug)]
pub struct ResultAssembler<'c> {
    config: &'c EngineConfig,
}

impl<'c> ResultAssembler<'c> {
    /// Create a new result assembler
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    fn kind_included(&self, kind: Kind) -> bool {
        match kind {
            Kind::Figure => self.config.include_figures,
            Kind::Table => self.config.include_tables,
        }
    }

    /// Assemble outcomes into the final result
    pub fn assemble(&self, counts: ScanCounts, outcomes: Vec<CandidateOutcome>) -> PairingResult {
        let mut stats = PairingStats {
            total_blocks_scanned: counts.blocks,
            total_candidates_raw: counts.raw,
            total_candidates_deduped: counts.deduped,
            ..PairingStats::default()
        };
        let mut pairs = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            match outcome {
                CandidateOutcome::Paired(pair) => {
                    if !self.kind_included(pair.kind()) {
                        stats.filtered_by_kind += 1;
                    } else if pair.confidence < self.config.min_confidence {
                        stats.filtered_low_confidence += 1;
                    } else {
                        pairs.push(pair);
                    }
                }
                CandidateOutcome::Dropped(fault) => {
                    log::warn!("dropping candidate: {fault}");
                    stats.dropped_candidates += 1;
                    stats.diagnostics.push(fault.to_string());
                }
            }
        }

        pairs.sort_by_key(|pair| (pair.candidate().position(), pair.candidate().span.start));

        let mut pages = BTreeSet::new();
        let mut total = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for pair in &pairs {
            *stats.counts_by_kind.entry(pair.kind()).or_insert(0) += 1;
            stats.reference_count += pair.bundle.cross_references.len();
            pages.insert(pair.candidate().source_block.page);
            total += pair.confidence;
            min = min.min(pair.confidence);
            max = max.max(pair.confidence);
        }

        if !pairs.is_empty() {
            stats.average_confidence = total / pairs.len() as f64;
            stats.min_confidence = min;
            stats.max_confidence = max;
        }
        stats.pages_covered = pages.into_iter().collect();

        PairingResult { pairs, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capmatch_core::{BlockRef, CaptionCandidate, ContextBundle, Span, TextBlock};

    fn pair(position: usize, page: u32, kind: Kind, confidence: f64) -> CandidateOutcome {
        CandidateOutcome::Paired(CaptionContextPair {
            bundle: ContextBundle {
                candidate: CaptionCandidate {
                    kind,
                    number: position.to_string(),
                    label: String::new(),
                    source_block: BlockRef {
                        position,
                        page,
                        index: 0,
                    },
                    span: Span::new(0, 4),
                    rule_id: "r".to_string(),
                    specificity: 1.0,
                },
                primary_context: vec![],
                cross_references: vec![TextBlock::new(page, 1, "ref")],
            },
            confidence,
        })
    }

    fn counts(n: usize) -> ScanCounts {
        ScanCounts {
            blocks: 10,
            raw: n,
            deduped: n,
        }
    }

    #[test]
    fn test_stats() {
        let config = EngineConfig::default();
        let result = ResultAssembler::new(&config).assemble(
            counts(3),
            vec![
                pair(5, 2, Kind::Table, 0.4),
                pair(1, 0, Kind::Figure, 0.8),
                pair(7, 2, Kind::Figure, 0.6),
            ],
        );

        let positions: Vec<usize> = result.pairs.iter().map(|p| p.candidate().position()).collect();
        assert_eq!(positions, vec![1, 5, 7]);
        assert_eq!(result.stats.counts_by_kind[&Kind::Figure], 2);
        assert_eq!(result.stats.counts_by_kind[&Kind::Table], 1);
        assert_eq!(result.stats.reference_count, 3);
        assert_eq!(result.stats.pages_covered, vec![0, 2]);
        assert!((result.stats.average_confidence - 0.6).abs() < 1e-9);
        assert_eq!(result.stats.min_confidence, 0.4);
        assert_eq!(result.stats.max_confidence, 0.8);
    }

    #[test]
    fn test_filters_counted() {
        let config = EngineConfig {
            min_confidence: 0.5,
            include_tables: false,
            ..EngineConfig::default()
        };
        let result = ResultAssembler::new(&config).assemble(
            counts(3),
            vec![
                pair(1, 0, Kind::Figure, 0.2),
                pair(2, 0, Kind::Table, 0.9),
                pair(3, 0, Kind::Figure, 0.9),
            ],
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.stats.filtered_low_confidence, 1);
        assert_eq!(result.stats.filtered_by_kind, 1);
    }

    #[test]
    fn test_dropped_candidates_reported() {
        let config = EngineConfig::default();
        let fault = CandidateFault::SpanOutOfRange {
            position: 4,
            start: 0,
            end: 99,
            len: 3,
        };
        let result = ResultAssembler::new(&config)
            .assemble(counts(1), vec![CandidateOutcome::Dropped(fault)]);
        assert!(result.is_empty());
        assert_eq!(result.stats.dropped_candidates, 1);
        assert_eq!(result.stats.diagnostics.len(), 1);
        assert!(result.stats.diagnostics[0].contains("block 4"));
    }

    #[test]
    fn test_empty() {
        let config = EngineConfig::default();
        let result = ResultAssembler::new(&config).assemble(ScanCounts::default(), vec![]);
        assert!(result.is_empty());
        assert_eq!(result.stats, PairingStats::default());
    }
}
