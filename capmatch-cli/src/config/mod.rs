//! Configuration module

use crate::{error::CliError, output::OutputFormat};
use anyhow::{Context, Result};
use capmatch_api::{ExecutionMode, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_SET};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration structure
#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct CliConfig {
    /// Pairing configuration
    #[serde(default)]
    pub pairing: PairingConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Performance configuration
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl CliConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| CliError::ConfigError(format!("{}: {e}", path.display())).into())
    }

    /// Load a configuration file, or use defaults when none is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Tuning preset the pairing options start from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Library defaults
    #[default]
    Balanced,
    /// Fewer, better-supported pairs
    Precise,
    /// More pairs, wider context
    Recall,
}

/// Pairing-related configuration. Unset options keep the preset's value.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PairingConfig {
    /// Starting preset
    pub preset: Preset,

    /// Built-in rule table name
    pub builtin_patterns: String,

    /// Custom rule table file, takes precedence over `builtin_patterns`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns_file: Option<PathBuf>,

    /// Blocks on each side of a caption considered as context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window_radius: Option<usize>,

    /// Label cap in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_label_length: Option<usize>,

    /// Distance in blocks under which candidates collapse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_block_distance: Option<usize>,

    /// Specificity, completeness and position weights
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_weights: Option<[f64; 3]>,

    /// Position signal for a caption without context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positional_penalty: Option<f64>,

    /// Confidence floor for emitted pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,

    /// Emit figure pairs
    pub include_figures: bool,

    /// Emit table pairs
    pub include_tables: bool,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            preset: Preset::Balanced,
            builtin_patterns: DEFAULT_SET.to_string(),
            patterns_file: None,
            context_window_radius: None,
            max_label_length: None,
            dedup_block_distance: None,
            confidence_weights: None,
            positional_penalty: None,
            min_confidence: None,
            include_figures: true,
            include_tables: true,
        }
    }
}

/// Output-related configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub default_format: OutputFormat,

    /// Include timing metadata in JSON output
    pub include_metadata: bool,

    /// Pretty print JSON output
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Json,
            include_metadata: false,
            pretty_json: true,
        }
    }
}

/// Performance-related configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Execution mode per document
    pub execution_mode: ExecutionMode,

    /// Block count from which adaptive mode goes parallel
    pub parallel_threshold_blocks: usize,

    /// Number of worker threads (0 = auto)
    pub worker_threads: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::Adaptive,
            parallel_threshold_blocks: DEFAULT_PARALLEL_THRESHOLD,
            worker_threads: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
[pairing]
preset = "recall"
context_window_radius = 4

[performance]
execution_mode = "sequential"
"#,
        )
        .unwrap();

        assert_eq!(config.pairing.preset, Preset::Recall);
        assert_eq!(config.pairing.context_window_radius, Some(4));
        assert_eq!(config.pairing.builtin_patterns, "default");
        assert!(config.pairing.include_tables);
        assert_eq!(config.output, OutputConfig::default());
        assert_eq!(config.performance.execution_mode, ExecutionMode::Sequential);
        assert_eq!(config.performance.parallel_threshold_blocks, 2000);
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let rendered = toml::to_string(&CliConfig::default()).unwrap();
        let parsed: CliConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, CliConfig::default());
    }

    #[test]
    fn test_load_reports_bad_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[output]\ndefault_format = \"yaml\"\n").unwrap();

        let err = CliConfig::load(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_or_default() {
        assert_eq!(CliConfig::load_or_default(None).unwrap(), CliConfig::default());
        assert!(CliConfig::load_or_default(Some(Path::new("/no/such.toml"))).is_err());
    }
}
