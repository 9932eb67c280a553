//! Caption and cross-reference recognizers
//!
//! A [`PatternSet`] is pure data: an ordered list of caption rules plus the
//! looser reference rules used to find inline mentions. Adding a marker
//! shape means editing a TOML table, never code.

pub mod config;
pub mod loader;

use std::collections::HashSet;
use std::path::Path;

use regex::{Captures, Regex};

use crate::error::PatternError;
use crate::types::{normalize_number, number_key, Kind, Span};
pub use config::{KindHint, PatternConfig};
pub use loader::{list_builtin, DEFAULT_SET};

/// Group holding the caption marker (`Figure`, `圖`, ...)
pub const MARKER_GROUP: &str = "marker";
/// Group holding the caption number
pub const NUMBER_GROUP: &str = "number";

fn resolve_kind(hint: KindHint, marker: &str) -> Option<Kind> {
    match hint {
        KindHint::Figure => Some(Kind::Figure),
        KindHint::Table => Some(Kind::Table),
        KindHint::Ambiguous => Kind::from_marker(marker),
    }
}

fn compile(id: &str, pattern: &str) -> Result<Regex, PatternError> {
    let regex = Regex::new(pattern).map_err(|source| PatternError::InvalidRegex {
        id: id.to_string(),
        source,
    })?;
    check_groups(id, &regex)?;
    Ok(regex)
}

/// Compile cue words into a matcher anchored at the start of the text that
/// follows a caption match. Words ending in an ASCII letter or digit must end
/// on a word boundary.
fn compile_cues(id: &str, words: &[String]) -> Result<Option<Regex>, PatternError> {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let escaped = regex::escape(w);
            if w.ends_with(|c: char| c.is_ascii_alphanumeric()) {
                format!(r"{escaped}\b")
            } else {
                escaped
            }
        })
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)^[\t\p{{Zs}}]*(?:{})", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| PatternError::InvalidRegex {
            id: id.to_string(),
            source,
        })
}

fn check_groups(id: &str, regex: &Regex) -> Result<(), PatternError> {
    for group in [MARKER_GROUP, NUMBER_GROUP] {
        if !regex.capture_names().flatten().any(|name| name == group) {
            return Err(PatternError::MissingGroup {
                id: id.to_string(),
                group,
            });
        }
    }
    Ok(())
}

/// A compiled caption recognizer
#[derive(Debug, Clone)]
pub struct CaptionRule {
    id: String,
    kind: KindHint,
    regex: Regex,
    specificity: f64,
    reject_after: Option<Regex>,
}

impl CaptionRule {
    /// Compile a caption rule
    pub fn new(
        id: impl Into<String>,
        kind: KindHint,
        pattern: &str,
        specificity: f64,
    ) -> Result<Self, PatternError> {
        let id = id.into();
        let regex = compile(&id, pattern)?;
        Ok(Self {
            id,
            kind,
            regex,
            specificity,
            reject_after: None,
        })
    }

    /// Discard matches immediately followed by one of `words`.
    ///
    /// "Figure 3 shows ..." starts like a loose caption but is prose that
    /// mentions the figure.
    pub fn with_reject_after(mut self, words: &[String]) -> Result<Self, PatternError> {
        self.reject_after = compile_cues(&self.id, words)?;
        Ok(self)
    }

    /// Rule id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared kind
    pub fn kind_hint(&self) -> KindHint {
        self.kind
    }

    /// Compiled matcher
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Rule weight
    pub fn specificity(&self) -> f64 {
        self.specificity
    }

    /// Resolve the kind of a match from its captured marker
    pub fn resolve_kind(&self, marker: &str) -> Option<Kind> {
        resolve_kind(self.kind, marker)
    }

    /// First accepted match starting at or after `offset`
    pub fn captures_at<'t>(&self, text: &'t str, offset: usize) -> Option<Captures<'t>> {
        let mut from = offset;
        loop {
            let caps = self.regex.captures_at(text, from)?;
            let whole = caps.get(0)?;
            if !self.rejects(&text[whole.end()..]) {
                return Some(caps);
            }
            let step = text[whole.start()..].chars().next()?.len_utf8();
            from = whole.start() + step;
        }
    }

    fn rejects(&self, rest: &str) -> bool {
        self.reject_after
            .as_ref()
            .is_some_and(|cues| cues.is_match(rest))
    }
}

/// A compiled cross-reference recognizer
#[derive(Debug, Clone)]
pub struct ReferenceRule {
    id: String,
    kind: KindHint,
    regex: Regex,
}

impl ReferenceRule {
    /// Compile a reference rule
    pub fn new(id: impl Into<String>, kind: KindHint, pattern: &str) -> Result<Self, PatternError> {
        let id = id.into();
        let regex = compile(&id, pattern)?;
        Ok(Self { id, kind, regex })
    }

    /// Rule id
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// An inline mention of a caption found by a reference rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Mentioned kind
    pub kind: Kind,
    /// Display-normalized number
    pub number: String,
    /// Byte range of the mention
    pub span: Span,
}

impl Mention {
    /// Separator-unified number
    pub fn number_key(&self) -> String {
        number_key(&self.number)
    }
}

/// Ordered collection of caption and reference rules
#[derive(Debug, Clone)]
pub struct PatternSet {
    name: String,
    description: String,
    captions: Vec<CaptionRule>,
    references: Vec<ReferenceRule>,
}

impl PatternSet {
    /// Assemble a set from compiled rules.
    ///
    /// Caption rules are stably sorted by descending specificity, so rules
    /// of equal weight keep their given order.
    pub fn new(
        name: impl Into<String>,
        mut captions: Vec<CaptionRule>,
        references: Vec<ReferenceRule>,
    ) -> Result<Self, PatternError> {
        captions.sort_by(|a, b| b.specificity.total_cmp(&a.specificity));
        let set = Self {
            name: name.into(),
            description: String::new(),
            captions,
            references,
        };
        set.validate()?;
        Ok(set)
    }

    /// Compile a parsed rule table
    pub fn from_config(config: &PatternConfig) -> Result<Self, PatternError> {
        let captions = config
            .captions
            .iter()
            .map(|rule| {
                CaptionRule::new(&rule.id, rule.kind, &rule.pattern, rule.specificity)?
                    .with_reject_after(&rule.reject_after)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let references = config
            .references
            .iter()
            .map(|rule| ReferenceRule::new(&rule.id, rule.kind, &rule.pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = Self::new(&config.metadata.name, captions, references)?;
        set.description = config.metadata.description.clone();
        Ok(set)
    }

    /// Parse and compile a TOML rule table
    pub fn from_toml_str(source: &str) -> Result<Self, PatternError> {
        let config: PatternConfig =
            toml::from_str(source).map_err(|e| PatternError::Parse(e.to_string()))?;
        Self::from_config(&config)
    }

    /// Load a TOML rule table from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| PatternError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        log::debug!("loaded rule table from {}", path.display());
        Self::from_toml_str(&source)
    }

    /// Load a built-in table by name
    pub fn builtin(name: &str) -> Result<Self, PatternError> {
        loader::get_builtin(name)
    }

    /// The default bilingual table
    pub fn default_set() -> Result<Self, PatternError> {
        loader::get_builtin(DEFAULT_SET)
    }

    /// Check the set's invariants: at least one caption rule, unique ids,
    /// mandatory groups and positive finite specificities.
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.captions.is_empty() {
            return Err(PatternError::NoCaptionRules);
        }

        let mut seen = HashSet::new();
        for rule in &self.captions {
            if !seen.insert(rule.id.as_str()) {
                return Err(PatternError::DuplicateId(rule.id.clone()));
            }
            if !rule.specificity.is_finite() || rule.specificity <= 0.0 {
                return Err(PatternError::InvalidSpecificity {
                    id: rule.id.clone(),
                    value: rule.specificity,
                });
            }
            check_groups(&rule.id, &rule.regex)?;
        }
        for rule in &self.references {
            if !seen.insert(rule.id.as_str()) {
                return Err(PatternError::DuplicateId(rule.id.clone()));
            }
            check_groups(&rule.id, &rule.regex)?;
        }
        Ok(())
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Caption rules in descending specificity
    pub fn captions(&self) -> &[CaptionRule] {
        &self.captions
    }

    /// Reference rules in table order
    pub fn references(&self) -> &[ReferenceRule] {
        &self.references
    }

    /// Highest caption rule specificity
    pub fn max_specificity(&self) -> f64 {
        self.captions
            .iter()
            .map(|rule| rule.specificity)
            .fold(0.0, f64::max)
    }

    /// True when any caption rule accepts a match somewhere in `text`
    pub fn is_caption_block(&self, text: &str) -> bool {
        self.captions
            .iter()
            .any(|rule| rule.captures_at(text, 0).is_some())
    }

    /// Inline mentions in `text`, ordered by position.
    ///
    /// Mentions whose marker does not resolve to a kind are skipped.
    pub fn find_references(&self, text: &str) -> Vec<Mention> {
        let mut mentions = Vec::new();
        for rule in &self.references {
            for caps in rule.regex.captures_iter(text) {
                let (Some(marker), Some(number)) =
                    (caps.name(MARKER_GROUP), caps.name(NUMBER_GROUP))
                else {
                    continue;
                };
                let Some(kind) = resolve_kind(rule.kind, marker.as_str()) else {
                    continue;
                };
                mentions.push(Mention {
                    kind,
                    number: normalize_number(number.as_str()),
                    span: Span::new(marker.start(), number.end()),
                });
            }
        }
        mentions.sort_by_key(|m| (m.span.start, m.span.end));
        mentions.dedup_by(|a, b| a.span == b.span && a.kind == b.kind);
        mentions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_set() -> PatternSet {
        PatternSet::default_set().unwrap()
    }

    #[test]
    fn test_default_set_sorted_by_specificity() {
        let set = default_set();
        let weights: Vec<f64> = set.captions().iter().map(|r| r.specificity()).collect();
        let mut sorted = weights.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(weights, sorted);
        assert_eq!(set.max_specificity(), 10.0);
    }

    #[test]
    fn test_is_caption_block() {
        let set = default_set();
        assert!(set.is_caption_block("Figure 1-1 abacus diagram"));
        assert!(set.is_caption_block("▲ 圖 3：流程"));
        assert!(set.is_caption_block("TABLE 2. Results"));
        assert!(set.is_caption_block("Fig. 4 Setup"));
        assert!(!set.is_caption_block("As shown in Figure 1-1, the device has beads."));
        assert!(!set.is_caption_block("如圖1-17所示，算盤有珠。"));
        assert!(!set.is_caption_block("The abacus was used in ancient China."));
        assert!(!set.is_caption_block("Figure 3 shows that rainfall peaks in July."));
        assert!(!set.is_caption_block("圖3顯示雨量分佈。"));
        assert!(set.is_caption_block("Figure 3 shows that\nFigure 4: Rainfall"));
    }

    #[test]
    fn test_reject_after_cues() {
        let rule = CaptionRule::new(
            "plate",
            KindHint::Figure,
            r"(?m)^(?P<marker>Plate)[\t ]*(?P<number>\d+)[\t ]*",
            2.0,
        )
        .unwrap()
        .with_reject_after(&["shows".to_string(), "，".to_string(), "  ".to_string()])
        .unwrap();

        assert!(rule.captures_at("Plate 4 shows the harbour", 0).is_none());
        assert!(rule.captures_at("Plate 4，港口", 0).is_none());
        assert!(rule.captures_at("Plate 4 Showroom at dusk", 0).is_some());

        let caps = rule
            .captures_at("Plate 1 shows boats\nPlate 2 Harbour", 0)
            .unwrap();
        assert_eq!(&caps["number"], "2");
    }

    #[test]
    fn test_reject_after_from_toml() {
        let set = PatternSet::from_toml_str(
            r#"
            [metadata]
            name = "plates"

            [[captions]]
            id = "plate"
            kind = "figure"
            pattern = '(?m)^(?P<marker>Plate)\s+(?P<number>\d+)\s*'
            specificity = 3.0
            reject_after = ["depicts"]
            "#,
        )
        .unwrap();
        assert!(set.is_caption_block("Plate 7 Harbour at dusk"));
        assert!(!set.is_caption_block("Plate 7 depicts the harbour"));
    }

    #[test]
    fn test_find_references_english() {
        let set = default_set();
        let mentions = set.find_references("As shown in Figure 1-1 and Table 2, see also fig. 3.");
        let found: Vec<(Kind, String)> =
            mentions.iter().map(|m| (m.kind, m.number.clone())).collect();
        assert_eq!(
            found,
            vec![
                (Kind::Figure, "1-1".to_string()),
                (Kind::Table, "2".to_string()),
                (Kind::Figure, "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_find_references_chinese_requires_cue() {
        let set = default_set();
        let mentions = set.find_references("如圖１－１７所示，代表3個單位。");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].kind, Kind::Figure);
        assert_eq!(mentions[0].number, "1-17");
        assert_eq!(mentions[0].number_key(), "1.17");
    }

    #[test]
    fn test_missing_group_rejected() {
        let err = CaptionRule::new("bad", KindHint::Figure, r"^Figure (\d+)", 1.0).unwrap_err();
        assert!(matches!(err, PatternError::MissingGroup { group: "marker", .. }));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = ReferenceRule::new("bad", KindHint::Table, r"(?P<marker>[").unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_weights() {
        let rule = |id: &str, weight: f64| {
            CaptionRule::new(id, KindHint::Figure, r"^(?P<marker>Fig)(?P<number>\d+)", weight)
                .unwrap()
        };

        let dup = PatternSet::new("dup", vec![rule("a", 1.0), rule("a", 2.0)], vec![]);
        assert!(matches!(dup, Err(PatternError::DuplicateId(_))));

        let zero = PatternSet::new("zero", vec![rule("a", 0.0)], vec![]);
        assert!(matches!(zero, Err(PatternError::InvalidSpecificity { .. })));

        let nan = PatternSet::new("nan", vec![rule("a", f64::NAN)], vec![]);
        assert!(matches!(nan, Err(PatternError::InvalidSpecificity { .. })));

        let empty = PatternSet::new("empty", vec![], vec![]);
        assert!(matches!(empty, Err(PatternError::NoCaptionRules)));
    }

    #[test]
    fn test_from_toml_str_parse_error() {
        assert!(matches!(
            PatternSet::from_toml_str("not = [valid"),
            Err(PatternError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("capmatch-patterns-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("plates.toml");
        std::fs::write(
            &path,
            r#"
            [metadata]
            name = "plates"
            description = "Plate captions"

            [[captions]]
            id = "plate"
            kind = "figure"
            pattern = '(?m)^(?P<marker>Plate)\s+(?P<number>\d+)[:.]?\s*'
            specificity = 3.0
            "#,
        )
        .unwrap();

        let set = PatternSet::from_file(&path).unwrap();
        assert_eq!(set.name(), "plates");
        assert_eq!(set.description(), "Plate captions");
        assert!(set.is_caption_block("Plate 7: Harbour at dusk"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            PatternSet::from_file("/nonexistent/capmatch/rules.toml"),
            Err(PatternError::Io { .. })
        ));
    }
}
