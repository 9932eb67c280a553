//! Validate command implementation

use anyhow::Result;
use capmatch_api::PatternSource;
use clap::{ArgGroup, Args};
use std::path::PathBuf;

use crate::config::CliConfig;

/// Arguments for the validate command
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).multiple(true).args(["patterns", "config"])))]
pub struct ValidateArgs {
    /// Rule table file to validate
    #[arg(short, long, value_name = "FILE")]
    pub patterns: Option<PathBuf>,

    /// CLI configuration file to validate
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> Result<()> {
        if let Some(path) = &self.patterns {
            println!("Validating rule table: {}", path.display());
            match PatternSource::File(path.clone()).load() {
                Ok(set) => {
                    println!("✓ Rule table is valid!");
                    println!("  Name: {}", set.name());
                    println!("  Caption rules: {}", set.captions().len());
                    println!("  Reference rules: {}", set.references().len());
                }
                Err(e) => {
                    println!("✗ Rule table is invalid!");
                    println!("  Error: {e}");
                    return Err(anyhow::anyhow!("Validation failed: {e}"));
                }
            }
        }

        if let Some(path) = &self.config {
            println!("Validating configuration: {}", path.display());
            let config = CliConfig::load(path).inspect_err(|_| {
                println!("✗ Configuration is invalid!");
            })?;
            println!("✓ Configuration is valid!");
            println!("  Preset: {:?}", config.pairing.preset);
            println!("  Output format: {:?}", config.output.default_format);
            println!("  Execution mode: {}", config.performance.execution_mode);
        }

        Ok(())
    }
}
