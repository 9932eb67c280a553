//! Context association
//!
//! A [`DocumentIndex`] is built once per document: which blocks are captions
//! and which `(kind, number)` pairs every other block mentions. It is then
//! shared read-only by the [`ContextAssociator`] for every candidate.

use std::collections::{BTreeSet, HashMap};

use crate::candidate::CandidateBuilder;
use crate::error::ContextError;
use crate::patterns::{Mention, PatternSet};
use crate::types::{BlockRef, CaptionCandidate, ContextBundle, Kind, TextBlock};

/// Default number of blocks considered on each side of a caption
pub const DEFAULT_WINDOW_RADIUS: usize = 3;

/// Everything one block contributes to a document pass
#[derive(Debug, Clone, Default)]
pub struct BlockScan {
    /// Caption candidates found in the block
    pub candidates: Vec<CaptionCandidate>,
    /// Whether any caption rule matches the block
    pub is_caption: bool,
    /// Inline mentions; left empty for caption blocks
    pub mentions: Vec<Mention>,
}

impl BlockScan {
    /// Scan a single block. Blocks are independent of each other, so scans
    /// may run in any order or concurrently.
    pub fn scan(
        builder: &CandidateBuilder<'_>,
        patterns: &PatternSet,
        position: usize,
        block: &TextBlock,
    ) -> Self {
        let candidates = builder.build(position, block);
        let is_caption = !candidates.is_empty() || patterns.is_caption_block(&block.text);
        let mentions = if is_caption {
            Vec::new()
        } else {
            patterns.find_references(&block.text)
        };
        Self {
            candidates,
            is_caption,
            mentions,
        }
    }
}

/// Per-document lookup tables shared by all candidates
#[derive(Debug)]
pub struct DocumentIndex<'a> {
    blocks: &'a [TextBlock],
    caption_mask: Vec<bool>,
    mentions: HashMap<(Kind, String), BTreeSet<usize>>,
}

impl<'a> DocumentIndex<'a> {
    /// Build the index from per-block scans given in document order
    pub fn from_scans<'s>(
        blocks: &'a [TextBlock],
        scans: impl IntoIterator<Item = &'s BlockScan>,
    ) -> Self {
        let mut caption_mask = Vec::with_capacity(blocks.len());
        let mut mentions: HashMap<(Kind, String), BTreeSet<usize>> = HashMap::new();

        for (position, scan) in scans.into_iter().enumerate() {
            caption_mask.push(scan.is_caption);
            if scan.is_caption {
                continue;
            }
            for mention in &scan.mentions {
                mentions
                    .entry((mention.kind, mention.number_key()))
                    .or_default()
                    .insert(position);
            }
        }
        caption_mask.resize(blocks.len(), false);

        Self {
            blocks,
            caption_mask,
            mentions,
        }
    }

    /// Scan every block and build the index in one pass
    pub fn build(blocks: &'a [TextBlock], patterns: &PatternSet) -> Self {
        let builder = CandidateBuilder::new(patterns);
        let scans: Vec<BlockScan> = blocks
            .iter()
            .enumerate()
            .map(|(position, block)| BlockScan::scan(&builder, patterns, position, block))
            .collect();
        Self::from_scans(blocks, &scans)
    }

    /// Number of blocks in the document
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True for an empty document
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// True when the block at `position` matches a caption rule
    pub fn is_caption(&self, position: usize) -> bool {
        self.caption_mask.get(position).copied().unwrap_or(false)
    }

    /// Resolve a block reference, failing if it no longer points at the
    /// block it was taken from.
    pub fn resolve(&self, block_ref: &BlockRef) -> Result<&'a TextBlock, ContextError> {
        self.blocks
            .get(block_ref.position)
            .filter(|block| block_ref.matches(block))
            .ok_or(ContextError::MalformedBlockReference {
                position: block_ref.position,
                page: block_ref.page,
                index: block_ref.index,
            })
    }

    /// Positions of non-caption blocks mentioning `(kind, key)`, ascending
    pub fn mentions_of(&self, kind: Kind, key: &str) -> impl Iterator<Item = usize> + '_ {
        self.mentions
            .get(&(kind, key.to_string()))
            .into_iter()
            .flat_map(|positions| positions.iter().copied())
    }
}

/// Gathers primary context and cross references for candidates
#[derive(Debug, Clone, Copy)]
pub struct ContextAssociator<'i, 'a> {
    index: &'i DocumentIndex<'a>,
    radius: usize,
}

impl<'i, 'a> ContextAssociator<'i, 'a> {
    /// Create an associator with the given window radius
    pub fn new(index: &'i DocumentIndex<'a>, radius: usize) -> Self {
        Self { index, radius }
    }

    /// Window radius
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Positions of the primary window around `position`.
    ///
    /// Excludes the caption block itself, blocks matching any caption rule
    /// and blank blocks. A larger radius yields a superset.
    pub fn window(&self, position: usize) -> Vec<usize> {
        if self.index.is_empty() {
            return Vec::new();
        }
        let lo = position.saturating_sub(self.radius);
        let hi = position
            .saturating_add(self.radius)
            .min(self.index.len() - 1);
        (lo..=hi)
            .filter(|&q| q != position)
            .filter(|&q| !self.index.is_caption(q))
            .filter(|&q| !self.index.blocks[q].is_blank())
            .collect()
    }

    /// Build the context bundle of one candidate
    pub fn associate(&self, candidate: &CaptionCandidate) -> Result<ContextBundle, ContextError> {
        let position = candidate.position();
        self.index.resolve(&candidate.source_block)?;

        let primary_context = self
            .window(position)
            .into_iter()
            .map(|q| self.index.blocks[q].clone())
            .collect();

        let cross_references = self
            .index
            .mentions_of(candidate.kind, &candidate.number_key())
            .filter(|&q| q != position)
            .map(|q| self.index.blocks[q].clone())
            .collect();

        Ok(ContextBundle {
            candidate: candidate.clone(),
            primary_context,
            cross_references,
        })
    }
}
