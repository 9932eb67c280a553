//! Confidence scoring
//!
//! Confidence is a weighted sum of three signals, each in [0, 1]:
//!
//! - **specificity**: the candidate's rule weight relative to the strongest
//!   rule of the set;
//! - **completeness**: how full the primary window is;
//! - **position**: penalised when a caption sits at the very start or end of
//!   the document with nothing around it.
//!
//! The result is clamped to [0, 1] and depends on nothing but the bundle and
//! the scorer's parameters.

use serde::{Deserialize, Serialize};

use crate::types::ContextBundle;

/// Default positional penalty
pub const DEFAULT_POSITIONAL_PENALTY: f64 = 0.5;

/// Relative weight of each confidence signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the specificity signal
    pub specificity: f64,
    /// Weight of the completeness signal
    pub completeness: f64,
    /// Weight of the position signal
    pub position: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            specificity: 1.0 / 3.0,
            completeness: 1.0 / 3.0,
            position: 1.0 / 3.0,
        }
    }
}

impl ScoreWeights {
    /// Create weights
    pub fn new(specificity: f64, completeness: f64, position: f64) -> Self {
        Self {
            specificity,
            completeness,
            position,
        }
    }

    /// Sum of the three weights
    pub fn sum(&self) -> f64 {
        self.specificity + self.completeness + self.position
    }

    /// Weights as an array in signal order
    pub fn as_array(&self) -> [f64; 3] {
        [self.specificity, self.completeness, self.position]
    }
}

/// Rule weight relative to the strongest rule
pub fn specificity_signal(specificity: f64, max_specificity: f64) -> f64 {
    if max_specificity <= 0.0 {
        return 0.0;
    }
    (specificity / max_specificity).clamp(0.0, 1.0)
}

/// Share of the `2 * radius` window slots that hold context
pub fn completeness_signal(found: usize, radius: usize) -> f64 {
    if radius == 0 {
        return 0.0;
    }
    (found as f64 / (2 * radius) as f64).min(1.0)
}

/// 1, or `1 - penalty` for a context-less caption at either document edge
pub fn position_signal(
    position: usize,
    document_len: usize,
    has_context: bool,
    penalty: f64,
) -> f64 {
    let at_edge = position == 0 || position + 1 >= document_len;
    if at_edge && !has_context {
        (1.0 - penalty).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Computes the confidence of context bundles
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    weights: ScoreWeights,
    positional_penalty: f64,
    window_radius: usize,
    max_specificity: f64,
    document_len: usize,
}

impl ConfidenceScorer {
    /// Create a scorer for one document
    pub fn new(
        weights: ScoreWeights,
        positional_penalty: f64,
        window_radius: usize,
        max_specificity: f64,
        document_len: usize,
    ) -> Self {
        Self {
            weights,
            positional_penalty,
            window_radius,
            max_specificity,
            document_len,
        }
    }

    /// The three signals of a bundle in weight order
    pub fn signals(&self, bundle: &ContextBundle) -> [f64; 3] {
        let candidate = &bundle.candidate;
        let found = bundle.primary_context.len();
        [
            specificity_signal(candidate.specificity, self.max_specificity),
            completeness_signal(found, self.window_radius),
            position_signal(
                candidate.position(),
                self.document_len,
                found > 0,
                self.positional_penalty,
            ),
        ]
    }

    /// Confidence in [0, 1]
    pub fn score(&self, bundle: &ContextBundle) -> f64 {
        let signals = self.signals(bundle);
        let weighted: f64 = self
            .weights
            .as_array()
            .iter()
            .zip(signals.iter())
            .map(|(w, s)| w * s)
            .sum();
        weighted.clamp(0.0, 1.0)
    }
}
