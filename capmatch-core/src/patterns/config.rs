//! TOML schema for caption rule tables

use serde::{Deserialize, Serialize};

/// Root of a rule table document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Table metadata
    pub metadata: Metadata,
    /// Caption recognizers, any order; sorted by specificity on load
    #[serde(default)]
    pub captions: Vec<CaptionRuleConfig>,
    /// Inline cross-reference recognizers
    #[serde(default)]
    pub references: Vec<ReferenceRuleConfig>,
}

/// Rule table metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Short name of the table
    pub name: String,
    /// Human readable description
    #[serde(default)]
    pub description: String,
}

/// Kind declared by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindHint {
    /// Every match is a figure
    Figure,
    /// Every match is a table
    Table,
    /// Kind is resolved from the captured marker
    Ambiguous,
}

/// One caption rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRuleConfig {
    /// Unique rule id
    pub id: String,
    /// Declared kind
    pub kind: KindHint,
    /// Regular expression with `marker` and `number` groups
    pub pattern: String,
    /// Rule weight, positive
    pub specificity: f64,
    /// Words that turn a match into prose when they directly follow it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reject_after: Vec<String>,
}

/// One cross-reference rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRuleConfig {
    /// Unique rule id
    pub id: String,
    /// Declared kind
    pub kind: KindHint,
    /// Regular expression with `marker` and `number` groups
    pub pattern: String,
}
