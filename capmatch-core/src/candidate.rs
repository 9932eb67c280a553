//! Raw caption candidate generation
//!
//! Each block is scanned on its own, left to right. At every step all caption
//! rules are tried from the current offset; the earliest match wins and ties
//! go to the more specific rule. Scanning resumes after the matched span.

use crate::error::CandidateFault;
use crate::patterns::{PatternSet, MARKER_GROUP, NUMBER_GROUP};
use crate::types::{normalize_number, BlockRef, CaptionCandidate, Span, TextBlock};

/// Specificity multiplier for a caption marker with no label text
pub const EMPTY_LABEL_FACTOR: f64 = 0.5;

/// Default cap on label length in characters
pub const DEFAULT_MAX_LABEL_LENGTH: usize = 120;

/// Characters skipped between a marker and its label
fn is_label_lead(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '：' | '.' | '．' | '-' | '–' | '—' | '－' | '、')
}

/// Byte offset at which the label starting at `text[0..]` ends: the first
/// line break, CJK terminator, or ASCII terminator that closes a sentence.
///
/// A period after a lone letter ("U.S. data") or before a lowercase word
/// ("approx. values") is an abbreviation and does not end the label.
fn sentence_end(text: &str) -> usize {
    let mut before: Option<char> = None;
    let mut prev: Option<char> = None;
    for (i, c) in text.char_indices() {
        match c {
            '\n' | '\r' | '。' | '！' | '？' => return i,
            '.' | '!' | '?' => {
                let rest = &text[i + c.len_utf8()..];
                let abbreviation = c == '.' && is_abbreviation(before, prev, rest);
                match rest.chars().next() {
                    None => return i,
                    Some(next) if next.is_whitespace() && !abbreviation => return i,
                    _ => {}
                }
            }
            _ => {}
        }
        before = prev;
        prev = Some(c);
    }
    text.len()
}

fn is_abbreviation(before: Option<char>, prev: Option<char>, rest: &str) -> bool {
    let lone_letter = prev.is_some_and(|p| p.is_alphabetic())
        && before.map_or(true, |b| b.is_whitespace() || b == '.');
    let lowercase_next = rest
        .trim_start()
        .chars()
        .next()
        .is_some_and(|n| n.is_lowercase());
    lone_letter || lowercase_next
}

/// Applies a [`PatternSet`] to single blocks
#[derive(Debug, Clone)]
pub struct CandidateBuilder<'p> {
    patterns: &'p PatternSet,
    max_label_length: usize,
}

impl<'p> CandidateBuilder<'p> {
    /// Create a builder with the default label cap
    pub fn new(patterns: &'p PatternSet) -> Self {
        Self {
            patterns,
            max_label_length: DEFAULT_MAX_LABEL_LENGTH,
        }
    }

    /// Set the label cap in characters
    pub fn with_max_label_length(mut self, max_label_length: usize) -> Self {
        self.max_label_length = max_label_length;
        self
    }

    /// Emit every caption candidate of the block at `position`.
    ///
    /// Malformed or caption-free text yields an empty vector.
    pub fn build(&self, position: usize, block: &TextBlock) -> Vec<CaptionCandidate> {
        let text = block.text.as_str();
        let source_block = BlockRef::new(position, block);
        let mut candidates = Vec::new();
        let mut offset = 0;

        while offset < text.len() {
            let mut best: Option<(usize, regex::Captures<'_>)> = None;
            for (rule_index, rule) in self.patterns.captions().iter().enumerate() {
                let Some(caps) = rule.captures_at(text, offset) else {
                    continue;
                };
                let start = caps.get(0).map_or(usize::MAX, |m| m.start());
                let better = match &best {
                    None => true,
                    Some((_, current)) => {
                        start < current.get(0).map_or(usize::MAX, |m| m.start())
                    }
                };
                if better {
                    best = Some((rule_index, caps));
                }
            }

            let Some((rule_index, caps)) = best else {
                break;
            };
            let rule = &self.patterns.captions()[rule_index];
            let Some(whole) = caps.get(0) else {
                break;
            };

            let mut next = whole.end();
            if let (Some(marker), Some(number)) = (caps.name(MARKER_GROUP), caps.name(NUMBER_GROUP))
            {
                match rule.resolve_kind(marker.as_str()) {
                    Some(kind) => {
                        let (label, label_end) = self.extract_label(text, whole.end());
                        let mut specificity = rule.specificity();
                        if label.is_empty() {
                            specificity *= EMPTY_LABEL_FACTOR;
                        }
                        log::trace!(
                            "block {position}: rule '{}' matched {} {}",
                            rule.id(),
                            kind,
                            number.as_str()
                        );
                        candidates.push(CaptionCandidate {
                            kind,
                            number: normalize_number(number.as_str()),
                            label,
                            source_block,
                            span: Span::new(whole.start(), label_end),
                            rule_id: rule.id().to_string(),
                            specificity,
                        });
                        next = next.max(label_end);
                    }
                    None => {
                        log::trace!(
                            "block {position}: marker '{}' of rule '{}' has no kind",
                            marker.as_str(),
                            rule.id()
                        );
                    }
                }
            }

            offset = if next > offset {
                next
            } else {
                // Zero-width match: step over one character.
                text[offset..]
                    .chars()
                    .next()
                    .map_or(text.len(), |c| offset + c.len_utf8())
            };
        }

        candidates
    }

    /// Label text following the match ending at `from`, and the byte offset
    /// where the consumed label ends.
    fn extract_label(&self, text: &str, from: usize) -> (String, usize) {
        let rest = &text[from..];
        let lead = rest
            .char_indices()
            .find(|(_, c)| !is_label_lead(*c) || matches!(c, '\n' | '\r'))
            .map_or(rest.len(), |(i, _)| i);
        let start = from + lead;
        let body = &text[start..];
        let end = start + sentence_end(body);

        let raw = &text[start..end];
        let trimmed_end = start + raw.trim_end().len();

        let capped_end = match text[start..trimmed_end]
            .char_indices()
            .nth(self.max_label_length)
        {
            Some((i, _)) => start + i,
            None => trimmed_end,
        };

        let label = text[start..capped_end].trim_end().to_string();
        if label.is_empty() {
            (label, from)
        } else {
            let end = start + label.len();
            (label, end)
        }
    }
}

/// Check that a candidate's span still fits its source block's text
pub fn check_span(candidate: &CaptionCandidate, block: &TextBlock) -> Result<(), CandidateFault> {
    let span = candidate.span;
    let position = candidate.position();
    let len = block.text.len();
    if span.start > span.end || span.end > len {
        return Err(CandidateFault::SpanOutOfRange {
            position,
            start: span.start,
            end: span.end,
            len,
        });
    }
    if !block.text.is_char_boundary(span.start) || !block.text.is_char_boundary(span.end) {
        return Err(CandidateFault::SpanNotOnCharBoundary {
            position,
            start: span.start,
            end: span.end,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;

    fn build(text: &str) -> Vec<CaptionCandidate> {
        let set = PatternSet::default_set().unwrap();
        CandidateBuilder::new(&set).build(0, &TextBlock::new(0, 0, text))
    }

    #[test]
    fn test_english_caption() {
        let found = build("Figure 1-1 abacus diagram");
        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert_eq!(c.kind, Kind::Figure);
        assert_eq!(c.number, "1-1");
        assert_eq!(c.label, "abacus diagram");
        assert_eq!(c.rule_id, "en-full-loose");
        assert_eq!(c.span, Span::new(0, "Figure 1-1 abacus diagram".len()));
    }

    #[test]
    fn test_separator_rule_preferred() {
        let found = build("Table 3: Annual rainfall. Values in mm.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, Kind::Table);
        assert_eq!(found[0].rule_id, "en-full-separator");
        assert_eq!(found[0].label, "Annual rainfall");
    }

    #[test]
    fn test_dotted_number_not_split() {
        let found = build("Figure 2.1 Block layout");
        assert_eq!(found[0].number, "2.1");
        assert_eq!(found[0].label, "Block layout");
    }

    #[test]
    fn test_chinese_caption_with_full_width_number() {
        let found = build("圖１－１７：算盤結構。其他說明");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, Kind::Figure);
        assert_eq!(found[0].number, "1-17");
        assert_eq!(found[0].label, "算盤結構");
        assert_eq!(found[0].rule_id, "zh-marker-colon");
    }

    #[test]
    fn test_chart_marker_is_figure() {
        let found = build("圖表 4 年度營收");
        assert_eq!(found[0].kind, Kind::Figure);
        let found = build("表格 2 人口統計");
        assert_eq!(found[0].kind, Kind::Table);
    }

    #[test]
    fn test_decorated_caption() {
        let found = build("■ Fig. 3: Pipeline");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number, "3");
        assert_eq!(found[0].label, "Pipeline");
    }

    #[test]
    fn test_empty_label_halves_specificity() {
        let labelled = build("Figure 5: Overview");
        let bare = build("Figure 5");
        assert_eq!(bare.len(), 1);
        assert!(bare[0].label.is_empty());
        assert_eq!(bare[0].rule_id, "en-full-loose");
        let loose = PatternSet::default_set()
            .unwrap()
            .captions()
            .iter()
            .find(|r| r.id() == "en-full-loose")
            .unwrap()
            .specificity();
        assert_eq!(bare[0].specificity, loose * EMPTY_LABEL_FACTOR);
        assert!(bare[0].specificity < labelled[0].specificity);
    }

    #[test]
    fn test_inline_mention_is_not_caption() {
        assert!(build("As shown in Figure 1-1, the device has beads.").is_empty());
        assert!(build("").is_empty());
        assert!(build("\u{0}\u{FFFD} garbage 123").is_empty());
    }

    #[test]
    fn test_prose_opening_with_marker_is_not_caption() {
        assert!(build("Figure 3 shows that rainfall peaks in July.").is_empty());
        assert!(build("Table 2, like Table 1, is sorted by year.").is_empty());
        assert!(build("Fig. 4 illustrates the setup.").is_empty());
        assert!(build("圖 2 所示為系統架構。").is_empty());
        assert!(build("表3中的數據來自普查。").is_empty());

        let found = build("Figure 3 Showcase of regional rainfall");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Showcase of regional rainfall");
    }

    #[test]
    fn test_label_keeps_abbreviations() {
        let found = build("Figure 1: Population of the U.S. by state");
        assert_eq!(found[0].label, "Population of the U.S. by state");

        let found = build("Table 4: Mean approx. values per site. Source: census.");
        assert_eq!(found[0].label, "Mean approx. values per site");

        let found = build("Figure 2: Map of the U.S. Census regions");
        assert_eq!(found[0].label, "Map of the U.S. Census regions");
    }

    #[test]
    fn test_multiple_captions_in_one_block() {
        let found = build("Figure 1: Left panel\nFigure 2: Right panel");
        let numbers: Vec<&str> = found.iter().map(|c| c.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2"]);
        assert_eq!(found[1].label, "Right panel");
        assert!(found[0].span.end <= found[1].span.start);
    }

    #[test]
    fn test_label_capped_on_char_boundary() {
        let set = PatternSet::default_set().unwrap();
        let builder = CandidateBuilder::new(&set).with_max_label_length(3);
        let block = TextBlock::new(0, 0, "圖 2：算盤的歷史演變");
        let found = builder.build(0, &block);
        assert_eq!(found[0].label, "算盤的");
        assert!(check_span(&found[0], &block).is_ok());
    }

    #[test]
    fn test_check_span_faults() {
        let mut candidate = build("Figure 1: x").remove(0);
        let block = TextBlock::new(0, 0, "short");
        candidate.span = Span::new(0, 50);
        assert!(matches!(
            check_span(&candidate, &block),
            Err(CandidateFault::SpanOutOfRange { .. })
        ));

        let block = TextBlock::new(0, 0, "圖");
        candidate.span = Span::new(0, 1);
        assert!(matches!(
            check_span(&candidate, &block),
            Err(CandidateFault::SpanNotOnCharBoundary { .. })
        ));
    }
}
