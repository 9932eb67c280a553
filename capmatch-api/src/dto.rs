//! Data Transfer Objects for API

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use capmatch_engine::{CaptionContextPair, PairingResult, TextBlock};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Page separator in plain text input
pub const PAGE_BREAK: char = '\u{000C}';

/// Input source for processing
pub enum Input {
    /// Already extracted blocks
    Blocks(Vec<TextBlock>),
    /// JSON array of blocks
    Json(String),
    /// Plain text; pages split by form feed, blocks by blank lines
    Text(String),
    /// File path; `.json` files hold blocks, anything else plain text
    File(PathBuf),
    /// Raw bytes of plain text (UTF-8)
    Bytes(Vec<u8>),
    /// Reader of plain text
    Reader(Box<dyn Read>),
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Blocks(blocks) => f.debug_tuple("Blocks").field(&blocks.len()).finish(),
            Input::Json(json) => f.debug_tuple("Json").field(&json.len()).finish(),
            Input::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Input::File(path) => f.debug_tuple("File").field(path).finish(),
            Input::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Input::Reader(_) => f.debug_tuple("Reader").field(&"<dyn Read>").finish(),
        }
    }
}

impl Input {
    /// Create input from extracted blocks
    pub fn from_blocks(blocks: Vec<TextBlock>) -> Self {
        Input::Blocks(blocks)
    }

    /// Create input from a JSON array of blocks
    pub fn from_json(json: impl Into<String>) -> Self {
        Input::Json(json.into())
    }

    /// Create input from plain text
    pub fn from_text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    /// Create input from file path
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Input::File(path.into())
    }

    /// Create input from bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }

    /// Create input from a reader
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Input::Reader(Box::new(reader))
    }

    /// Resolve the input into blocks in document order
    pub fn read_blocks(self) -> Result<Vec<TextBlock>> {
        match self {
            Input::Blocks(blocks) => Ok(blocks),
            Input::Json(json) => blocks_from_json(&json),
            Input::Text(text) => Ok(blocks_from_text(&text)),
            Input::File(path) => {
                let content = fs::read_to_string(&path).map_err(ApiError::Io)?;
                let is_json = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if is_json {
                    blocks_from_json(&content)
                } else {
                    Ok(blocks_from_text(&content))
                }
            }
            Input::Bytes(bytes) => {
                let text = String::from_utf8(bytes).map_err(ApiError::Utf8)?;
                Ok(blocks_from_text(&text))
            }
            Input::Reader(mut reader) => {
                let mut buffer = String::new();
                reader.read_to_string(&mut buffer).map_err(ApiError::Io)?;
                Ok(blocks_from_text(&buffer))
            }
        }
    }
}

/// Parse a JSON array of blocks
pub fn blocks_from_json(json: &str) -> Result<Vec<TextBlock>> {
    Ok(serde_json::from_str(json)?)
}

/// Split plain text into blocks.
///
/// Form feeds separate pages and blank lines separate blocks. Block indices
/// restart on every page; blank blocks are not emitted.
pub fn blocks_from_text(text: &str) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    for (page, page_text) in text.split(PAGE_BREAK).enumerate() {
        let mut index = 0u32;
        let mut current: Vec<&str> = Vec::new();
        for line in page_text.lines().chain(std::iter::once("")) {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    blocks.push(TextBlock::new(page as u32, index, current.join("\n")));
                    index += 1;
                    current.clear();
                }
            } else {
                current.push(line.trim_end());
            }
        }
    }
    blocks
}

/// Block information for serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDTO {
    /// Page number
    pub page: u32,
    /// Index within the page
    pub index: u32,
    /// Block text
    pub text: String,
}

impl From<&TextBlock> for BlockDTO {
    fn from(block: &TextBlock) -> Self {
        Self {
            page: block.page,
            index: block.index,
            text: block.text.clone(),
        }
    }
}

/// Caption information for serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionDTO {
    /// `figure` or `table`
    pub kind: String,
    /// Display-normalized number
    pub number: String,
    /// Caption label
    pub label: String,
    /// Page of the caption block
    pub page: u32,
    /// Index of the caption block within its page
    pub block_index: u32,
    /// Byte offset of the caption in its block
    pub span_start: usize,
    /// Byte offset past the caption in its block
    pub span_end: usize,
    /// Rule that matched
    pub rule_id: String,
}

/// Caption/context pair for serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDTO {
    /// The caption
    pub caption: CaptionDTO,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Nearby descriptive blocks
    pub primary_context: Vec<BlockDTO>,
    /// Blocks mentioning the caption
    pub cross_references: Vec<BlockDTO>,
    /// Caption and passages rendered as one prompt block
    pub combined_text: String,
}

impl From<&CaptionContextPair> for PairDTO {
    fn from(pair: &CaptionContextPair) -> Self {
        let candidate = pair.candidate();
        Self {
            caption: CaptionDTO {
                kind: candidate.kind.to_string(),
                number: candidate.number.clone(),
                label: candidate.label.clone(),
                page: candidate.source_block.page,
                block_index: candidate.source_block.index,
                span_start: candidate.span.start,
                span_end: candidate.span.end,
                rule_id: candidate.rule_id.clone(),
            },
            confidence: pair.confidence,
            primary_context: pair.bundle.primary_context.iter().map(BlockDTO::from).collect(),
            cross_references: pair.bundle.cross_references.iter().map(BlockDTO::from).collect(),
            combined_text: pair.bundle.combined_text(),
        }
    }
}

/// Aggregate statistics for serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsDTO {
    /// Blocks in the input
    pub total_blocks_scanned: usize,
    /// Candidates before deduplication
    pub total_candidates_raw: usize,
    /// Candidates after deduplication
    pub total_candidates_deduped: usize,
    /// Emitted pairs per kind
    pub counts_by_kind: BTreeMap<String, usize>,
    /// Cross-reference blocks across pairs
    pub reference_count: usize,
    /// Mean confidence
    pub average_confidence: f64,
    /// Lowest confidence
    pub min_confidence: f64,
    /// Highest confidence
    pub max_confidence: f64,
    /// Pages holding emitted captions
    pub pages_covered: Vec<u32>,
    /// Candidates dropped for faults
    pub dropped_candidates: usize,
    /// Fault messages
    pub diagnostics: Vec<String>,
    /// Pairs below the confidence floor
    pub filtered_low_confidence: usize,
    /// Pairs of excluded kinds
    pub filtered_by_kind: usize,
}

/// Processing metadata with runtime statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Execution mode used
    pub mode_used: String,
    /// Number of threads available to the run
    pub thread_count: usize,
    /// Name of the rule table
    pub patterns: String,
}

/// Complete output with pairs, statistics and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Pairs in document order
    pub pairs: Vec<PairDTO>,
    /// Aggregate statistics
    pub stats: StatsDTO,
    /// Processing metadata; varies between runs
    pub metadata: Metadata,
}

impl Output {
    /// Convert an engine result
    pub fn from_result(result: &PairingResult, metadata: Metadata) -> Self {
        let stats = &result.stats;
        Self {
            pairs: result.pairs.iter().map(PairDTO::from).collect(),
            stats: StatsDTO {
                total_blocks_scanned: stats.total_blocks_scanned,
                total_candidates_raw: stats.total_candidates_raw,
                total_candidates_deduped: stats.total_candidates_deduped,
                counts_by_kind: stats
                    .counts_by_kind
                    .iter()
                    .map(|(kind, count)| (kind.to_string(), *count))
                    .collect(),
                reference_count: stats.reference_count,
                average_confidence: stats.average_confidence,
                min_confidence: stats.min_confidence,
                max_confidence: stats.max_confidence,
                pages_covered: stats.pages_covered.clone(),
                dropped_candidates: stats.dropped_candidates,
                diagnostics: stats.diagnostics.clone(),
                filtered_low_confidence: stats.filtered_low_confidence,
                filtered_by_kind: stats.filtered_by_kind,
            },
            metadata,
        }
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pair was found
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
