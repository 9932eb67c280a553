//! Domain types shared by every pairing stage
//!
//! Blocks arrive in document order and are never reordered. Candidates,
//! bundles and pairs refer back to their source block through a [`BlockRef`]
//! instead of a borrow so results can outlive the input slice.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Rectangular region of a block on its page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// A positioned unit of extracted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Zero-based page number
    pub page: u32,
    /// Ordinal of the block within its page
    pub index: u32,
    /// Raw block text
    pub text: String,
    /// Region on the page, when the ingestion layer knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl TextBlock {
    /// Create a block without a bounding box
    pub fn new(page: u32, index: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            index,
            text: text.into(),
            bbox: None,
        }
    }

    /// Attach a bounding box
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// True when the block holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Caption kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Figures, charts, pictures and other images
    Figure,
    /// Tables
    Table,
}

impl Kind {
    /// Resolve a caption marker through the marker lexicon.
    ///
    /// Markers are compared case-insensitively with a trailing dot removed,
    /// so `"Fig."`, `"FIGURE"` and `"figure"` all resolve to [`Kind::Figure`].
    /// Charts (`圖表`) count as figures.
    pub fn from_marker(marker: &str) -> Option<Self> {
        let marker = marker.trim().trim_end_matches(['.', '．']).to_lowercase();
        match marker.as_str() {
            "figure" | "fig" | "圖" | "图" | "圖表" | "图表" | "圖片" | "图片" | "圖像"
            | "图像" => Some(Kind::Figure),
            "table" | "tab" | "表" | "表格" => Some(Kind::Table),
            _ => None,
        }
    }

    /// Lowercase name used in serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Figure => "figure",
            Kind::Table => "table",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned reference to a block of the input sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockRef {
    /// Ordinal of the block in the input sequence
    pub position: usize,
    /// Page of the referenced block
    pub page: u32,
    /// Index of the referenced block within its page
    pub index: u32,
}

impl BlockRef {
    /// Reference the block found at `position`
    pub fn new(position: usize, block: &TextBlock) -> Self {
        Self {
            position,
            page: block.page,
            index: block.index,
        }
    }

    /// True when `block` is the block this reference was taken from
    pub fn matches(&self, block: &TextBlock) -> bool {
        self.page == block.page && self.index == block.index
    }
}

/// Byte range inside a block's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset
    pub start: usize,
    /// Exclusive end offset
    pub end: usize,
}

impl Span {
    /// Create a span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for a zero-length span
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A caption recognised inside one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCandidate {
    /// Figure or table
    pub kind: Kind,
    /// Display-normalized number (`"1-17"`, `"3.2"`)
    pub number: String,
    /// Caption text following the marker, possibly empty
    pub label: String,
    /// Block the caption was found in
    pub source_block: BlockRef,
    /// Byte range of marker, number, separator and label
    pub span: Span,
    /// Id of the rule that produced the match
    pub rule_id: String,
    /// Rule specificity, halved for empty labels
    pub specificity: f64,
}

impl CaptionCandidate {
    /// Separator-unified number used for deduplication and cross references
    pub fn number_key(&self) -> String {
        number_key(&self.number)
    }

    /// Position of the source block in the input sequence
    pub fn position(&self) -> usize {
        self.source_block.position
    }

    /// Label length in characters
    pub fn label_chars(&self) -> usize {
        self.label.chars().count()
    }
}

/// Normalize a captured caption number for display.
///
/// Full-width digits become ASCII, dash variants become `-`, dot variants
/// become `.` and whitespace is dropped.
pub fn normalize_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '‐' | '‑' | '‒' | '–' | '—' | '―' | '－' => '-',
            '．' | '・' => '.',
            other => other,
        })
        .collect()
}

/// Unify separators of a caption number: `"1-17"`, `"1.17"` and `"01．17"`
/// all become `"1.17"`.
pub fn number_key(number: &str) -> String {
    let normalized = normalize_number(number);
    normalized
        .split(['.', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let trimmed = part.trim_start_matches('0');
            if trimmed.is_empty() {
                "0"
            } else {
                trimmed
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// A candidate together with the prose that describes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    /// The caption
    pub candidate: CaptionCandidate,
    /// Nearby descriptive blocks in document order
    pub primary_context: Vec<TextBlock>,
    /// Blocks anywhere in the document that mention the caption, in
    /// document order and without repeats
    pub cross_references: Vec<TextBlock>,
}

impl ContextBundle {
    /// Render the caption and its passages as one text block for the
    /// description-generation layer.
    ///
    /// ```text
    /// 圖表說明：Figure 1-1 abacus diagram
    ///
    /// 相關內文：
    /// 1. The abacus was used in ancient China.
    /// 2. As shown in Figure 1-1, the device has beads.
    /// ```
    pub fn combined_text(&self) -> String {
        let marker = match self.candidate.kind {
            Kind::Figure => "Figure",
            Kind::Table => "Table",
        };
        let mut out = format!("圖表說明：{marker} {}", self.candidate.number);
        if !self.candidate.label.is_empty() {
            out.push(' ');
            out.push_str(&self.candidate.label);
        }

        let in_window: HashSet<(u32, u32)> = self
            .primary_context
            .iter()
            .map(|block| (block.page, block.index))
            .collect();
        let passages: Vec<&str> = self
            .primary_context
            .iter()
            .chain(
                self.cross_references
                    .iter()
                    .filter(|block| !in_window.contains(&(block.page, block.index))),
            )
            .map(|block| block.text.trim())
            .filter(|text| !text.is_empty())
            .collect();

        if !passages.is_empty() {
            out.push_str("\n\n相關內文：");
            for (i, text) in passages.iter().enumerate() {
                out.push_str(&format!("\n{}. {text}", i + 1));
            }
        }
        out
    }
}

/// A scored caption/context pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionContextPair {
    /// Caption and context
    pub bundle: ContextBundle,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl CaptionContextPair {
    /// The paired caption
    pub fn candidate(&self) -> &CaptionCandidate {
        &self.bundle.candidate
    }

    /// Caption kind
    pub fn kind(&self) -> Kind {
        self.bundle.candidate.kind
    }
}
