//! Configuration types for the engine

use capmatch_core::{
    ScoreWeights, DEFAULT_DEDUP_DISTANCE, DEFAULT_MAX_LABEL_LENGTH, DEFAULT_POSITIONAL_PENALTY,
    DEFAULT_WINDOW_RADIUS,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, Result},
    ExecutionMode,
};

/// Tolerance for the weight sum check
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Block count at which adaptive mode switches to parallel execution
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2_000;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Blocks considered on each side of a caption, > 0
    pub context_window_radius: usize,
    /// Label cap in characters, > 0
    pub max_label_length: usize,
    /// Block distance within which equal captions merge
    pub dedup_block_distance: usize,
    /// Signal weights, non-negative and summing to 1
    pub confidence_weights: ScoreWeights,
    /// Position signal penalty in [0, 1]
    pub positional_penalty: f64,
    /// Pairs scoring below this are dropped, in [0, 1]
    pub min_confidence: f64,
    /// Emit figure pairs
    pub include_figures: bool,
    /// Emit table pairs
    pub include_tables: bool,
    /// Execution mode selector
    pub execution_mode: ExecutionMode,
    /// Number of threads for parallel execution (None = rayon default)
    pub threads: Option<usize>,
    /// Minimum block count for adaptive parallel execution
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_window_radius: DEFAULT_WINDOW_RADIUS,
            max_label_length: DEFAULT_MAX_LABEL_LENGTH,
            dedup_block_distance: DEFAULT_DEDUP_DISTANCE,
            confidence_weights: ScoreWeights::default(),
            positional_penalty: DEFAULT_POSITIONAL_PENALTY,
            min_confidence: 0.0,
            include_figures: true,
            include_tables: true,
            execution_mode: ExecutionMode::Adaptive,
            threads: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Favour precision: tight window, specificity-heavy weights and a
    /// confidence floor.
    pub fn precise() -> Self {
        Self {
            context_window_radius: 2,
            confidence_weights: ScoreWeights::new(0.5, 0.3, 0.2),
            positional_penalty: 0.7,
            min_confidence: 0.3,
            ..Self::default()
        }
    }

    /// Favour recall: wide window, lenient dedup and no confidence floor
    pub fn recall() -> Self {
        Self {
            context_window_radius: 5,
            max_label_length: 200,
            dedup_block_distance: 2,
            confidence_weights: ScoreWeights::new(0.2, 0.5, 0.3),
            positional_penalty: 0.3,
            min_confidence: 0.0,
            ..Self::default()
        }
    }

    /// Check every value; nothing is clamped
    pub fn validate(&self) -> Result<()> {
        if self.context_window_radius == 0 {
            return Err(invalid("context_window_radius must be greater than 0"));
        }
        if self.max_label_length == 0 {
            return Err(invalid("max_label_length must be greater than 0"));
        }

        let weights = self.confidence_weights;
        for (name, value) in [
            ("specificity", weights.specificity),
            ("completeness", weights.completeness),
            ("position", weights.position),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "confidence weight '{name}' must be a non-negative number, got {value}"
                )));
            }
        }
        if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!(
                "confidence weights must sum to 1, got {}",
                weights.sum()
            )));
        }

        check_unit("positional_penalty", self.positional_penalty)?;
        check_unit("min_confidence", self.min_confidence)?;

        if self.threads == Some(0) {
            return Err(invalid("threads must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfiguration(message.into())
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_presets_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::precise().validate().is_ok());
        assert!(EngineConfig::recall().validate().is_ok());
    }

    #[test]
    fn test_zero_radius_rejected() {
        let config = EngineConfig {
            context_window_radius: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let config = EngineConfig {
            confidence_weights: ScoreWeights::new(0.5, 0.5, 0.5),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            confidence_weights: ScoreWeights::new(1.2, -0.1, -0.1),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_penalty_range() {
        let config = EngineConfig {
            positional_penalty: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            positional_penalty: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_dedup_distance_allowed() {
        let config = EngineConfig {
            dedup_block_distance: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = EngineConfig {
            threads: Some(0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
