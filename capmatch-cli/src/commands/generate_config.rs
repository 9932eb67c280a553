//! Generate config command implementation

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Kinds of template the command can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateKind {
    /// CLI configuration file
    Config,
    /// Caption rule table
    Patterns,
}

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Template to write
    #[arg(short, long, value_enum, default_value = "config")]
    pub kind: TemplateKind,

    /// Name of the rule table (patterns template only)
    #[arg(short, long, value_name = "NAME", default_value = "custom")]
    pub name: String,

    /// Output file path
    #[arg(short, long, value_name = "FILE", required = true)]
    pub output: PathBuf,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        use std::fs;

        let template = match self.kind {
            TemplateKind::Config => config_template(),
            TemplateKind::Patterns => patterns_template(&self.name),
        };

        fs::write(&self.output, template)
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        println!("✓ Template written to {}", self.output.display());
        println!();
        println!("Next steps:");
        match self.kind {
            TemplateKind::Config => {
                println!("1. Edit the settings you want to change");
                println!("2. capmatch validate --config {}", self.output.display());
                println!(
                    "3. capmatch process -i document.txt --config {}",
                    self.output.display()
                );
            }
            TemplateKind::Patterns => {
                println!("1. Add or edit caption and reference rules");
                println!("2. capmatch validate --patterns {}", self.output.display());
                println!(
                    "3. capmatch process -i document.txt --patterns {}",
                    self.output.display()
                );
            }
        }

        Ok(())
    }
}

fn config_template() -> String {
    format!(
        r#"# capmatch configuration
#
# Command-line flags take precedence over the values below.

[pairing]
# balanced | precise | recall
preset = "balanced"

# Built-in rule table (see `capmatch list patterns`)
builtin_patterns = "default"

# Custom rule table; takes precedence over builtin_patterns
# patterns_file = "patterns.toml"

# Unset values keep the preset's setting
# context_window_radius = 3
# max_label_length = 120
# dedup_block_distance = 1
# confidence_weights = [0.4, 0.3, 0.3]  # specificity, completeness, position
# positional_penalty = 0.5
# min_confidence = 0.0

include_figures = true
include_tables = true

[output]
# json | text | markdown
default_format = "json"
# Timing metadata makes output differ between runs
include_metadata = false
pretty_json = true

[performance]
# sequential | parallel | adaptive
execution_mode = "adaptive"
parallel_threshold_blocks = {}
# 0 = one thread per core
worker_threads = 0
"#,
        capmatch_api::DEFAULT_PARALLEL_THRESHOLD
    )
}

fn patterns_template(name: &str) -> String {
    format!(
        r#"# Caption rule table
#
# Caption rules must expose the named groups `marker` and `number`.
# `kind` is figure, table or ambiguous (resolved from the marker word).
# Higher specificity wins when two rules match at the same place.
# `reject_after` lists words that mark a match as prose when they follow it.

[metadata]
name = "{name}"
description = "Custom caption rules"

# Figure 1: ... / Table 2.1. ...
[[captions]]
id = "full-separator"
kind = "ambiguous"
pattern = '(?m)^[\t\p{{Zs}}]*(?P<marker>(?i:figure|table))[\t\p{{Zs}}]*(?P<number>[0-9]+(?:[.\-][0-9]+)*)[\t\p{{Zs}}]*(?P<sep>[:.])(?:[\t\p{{Zs}}]+|$)'
specificity = 9.0

# Plate 4 Harbour at dawn (but not "Plate 4 shows ...")
[[captions]]
id = "plate"
kind = "figure"
pattern = '(?m)^[\t\p{{Zs}}]*(?P<marker>Plate)[\t\p{{Zs}}]*(?P<number>[0-9]+)[\t\p{{Zs}}]*'
specificity = 5.0
reject_after = ["shows", "depicts", "and", ","]

# see Figure 1 / Table 2.1 shows
[[references]]
id = "inline"
kind = "ambiguous"
pattern = '(?i)\b(?P<marker>figure|table)[\t\p{{Zs}}]*(?P<number>[0-9]+(?:[.\-][0-9]+)*)'
"#
    )
}
