//! CLI command implementations

use anyhow::Result;
use clap::{Subcommand, ValueEnum};

use crate::output::OutputFormat;

pub mod generate_config;
pub mod process;
pub mod validate;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pair captions with their context in one or more documents
    Process(process::ProcessArgs),

    /// Check a rule table or configuration file
    Validate(validate::ValidateArgs),

    /// Write a commented configuration or rule table template
    GenerateConfig(generate_config::GenerateConfigArgs),

    /// List available components
    List {
        #[command(subcommand)]
        subcommand: ListCommands,
    },
}

/// List subcommands
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ListCommands {
    /// List built-in rule tables
    Patterns,

    /// List available output formats
    Formats,

    /// List execution modes
    Modes,
}

impl Commands {
    /// Execute the selected command
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::Process(args) => args.execute(),
            Commands::Validate(args) => args.execute(),
            Commands::GenerateConfig(args) => args.execute(),
            Commands::List { subcommand } => {
                print!("{}", subcommand.render());
                Ok(())
            }
        }
    }
}

impl ListCommands {
    /// Render the listing
    pub fn render(self) -> String {
        let mut out = String::new();
        match self {
            ListCommands::Patterns => {
                out.push_str("Built-in rule tables:\n");
                for (name, description) in capmatch_api::list_builtin() {
                    out.push_str(&format!("  {name:<10} {description}\n"));
                }
            }
            ListCommands::Formats => {
                out.push_str("Output formats:\n");
                for format in OutputFormat::value_variants() {
                    if let Some(value) = format.to_possible_value() {
                        let help = value.get_help().map(|h| h.to_string()).unwrap_or_default();
                        out.push_str(&format!("  {:<10} {help}\n", value.get_name()));
                    }
                }
            }
            ListCommands::Modes => {
                out.push_str("Execution modes:\n");
                out.push_str("  sequential single thread\n");
                out.push_str(&format!(
                    "  parallel   rayon worker pool ({} cores available)\n",
                    num_cpus::get()
                ));
                out.push_str(&format!(
                    "  adaptive   parallel from {} blocks per document (default)\n",
                    capmatch_api::DEFAULT_PARALLEL_THRESHOLD
                ));
            }
        }
        out
    }
}
