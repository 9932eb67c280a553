//! Process command implementation

use anyhow::{Context, Result};
use capmatch_api::{Config, ExecutionMode, Output, PairingProcessor, PatternSource};
use clap::Args;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    config::{CliConfig, Preset},
    error::CliError,
    input::{resolve_patterns, FileReader},
    output::{JsonFormatter, MarkdownFormatter, OutputFormat, OutputFormatter, TextFormatter},
    progress::ProgressReporter,
};

/// Arguments for the process command
#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input files or patterns (supports glob); `.json` files hold blocks
    #[arg(short, long, value_name = "FILE/PATTERN", required = true)]
    pub input: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format [default: json]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", env = "CAPMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tuning preset
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Custom rule table file
    #[arg(short, long, value_name = "FILE", conflicts_with = "builtin")]
    pub patterns: Option<PathBuf>,

    /// Built-in rule table
    #[arg(short, long, value_name = "NAME")]
    pub builtin: Option<String>,

    /// Context window radius in blocks
    #[arg(short, long, value_name = "BLOCKS")]
    pub window: Option<usize>,

    /// Drop pairs below this confidence
    #[arg(long, value_name = "SCORE")]
    pub min_confidence: Option<f64>,

    /// Only emit figure pairs
    #[arg(long, conflicts_with = "tables_only")]
    pub figures_only: bool,

    /// Only emit table pairs
    #[arg(long)]
    pub tables_only: bool,

    /// Execution mode per document
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Number of worker threads
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Include timing metadata in JSON output
    #[arg(long)]
    pub include_metadata: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Execution modes accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Single thread
    Sequential,
    /// Rayon worker pool
    Parallel,
    /// Pick from the document size
    Adaptive,
}

impl From<Mode> for ExecutionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sequential => ExecutionMode::Sequential,
            Mode::Parallel => ExecutionMode::Parallel,
            Mode::Adaptive => ExecutionMode::Adaptive,
        }
    }
}

impl ProcessArgs {
    /// Execute the process command
    pub fn execute(&self) -> Result<()> {
        // Initialize logging based on verbosity
        self.init_logging();

        log::info!("Starting caption pairing");
        log::debug!("Arguments: {:?}", self);

        let file_config = CliConfig::load_or_default(self.config.as_deref())?;
        let config = self.build_config(&file_config)?;
        log::info!("Rule table: {}", describe_patterns(config.patterns()));

        let processor = PairingProcessor::with_config(config)
            .map_err(|e| CliError::ConfigError(e.to_string()))?;

        let files = resolve_patterns(&self.input)?;
        log::info!("Found {} document(s) to process", files.len());

        let mut progress = ProgressReporter::new(self.quiet);
        progress.init_files(files.len() as u64);

        // Documents are independent; collect keeps input order
        let outputs = files
            .par_iter()
            .map(|path| {
                let output = process_file(&processor, path)?;
                progress.file_completed(&path.display().to_string(), output.len());
                Ok((path.display().to_string(), output))
            })
            .collect::<Result<Vec<_>>>()?;
        progress.finish();

        let total: usize = outputs.iter().map(|(_, output)| output.len()).sum();
        log::info!("Paired {total} caption(s)");

        let format = self.format.unwrap_or(file_config.output.default_format);
        let mut formatter = self.create_formatter(format, &file_config)?;
        for (source, output) in &outputs {
            formatter.format_document(source, output)?;
        }
        formatter.finish()?;

        Ok(())
    }

    /// Merge the configuration file and the flags into an API configuration.
    /// Flags win over the file.
    pub fn build_config(&self, file: &CliConfig) -> Result<Config> {
        let pairing = &file.pairing;
        let performance = &file.performance;

        let mut builder = match self.preset.unwrap_or(pairing.preset) {
            Preset::Balanced => Config::builder(),
            Preset::Precise => Config::builder().precise(),
            Preset::Recall => Config::builder().recall(),
        };

        if let Some(radius) = self.window.or(pairing.context_window_radius) {
            builder = builder.context_window_radius(radius);
        }
        if let Some(length) = pairing.max_label_length {
            builder = builder.max_label_length(length);
        }
        if let Some(distance) = pairing.dedup_block_distance {
            builder = builder.dedup_block_distance(distance);
        }
        if let Some([specificity, completeness, position]) = pairing.confidence_weights {
            builder = builder.confidence_weights(specificity, completeness, position);
        }
        if let Some(penalty) = pairing.positional_penalty {
            builder = builder.positional_penalty(penalty);
        }
        if let Some(floor) = self.min_confidence.or(pairing.min_confidence) {
            builder = builder.min_confidence(floor);
        }
        builder = builder
            .include_figures(pairing.include_figures && !self.tables_only)
            .include_tables(pairing.include_tables && !self.figures_only);

        builder = match (&self.patterns, &self.builtin, &pairing.patterns_file) {
            (Some(path), _, _) => builder.patterns_file(path),
            (None, Some(name), _) => builder.patterns_builtin(name),
            (None, None, Some(path)) => builder.patterns_file(path),
            (None, None, None) => builder.patterns_builtin(&pairing.builtin_patterns),
        };

        let threads = self.threads.or(match performance.worker_threads {
            0 => None,
            count => Some(count),
        });
        if let Some(count) = threads {
            let cores = num_cpus::get();
            if count > cores {
                log::warn!("{count} threads requested but only {cores} cores are available");
            }
        }
        let mode = self
            .mode
            .map(ExecutionMode::from)
            .unwrap_or(performance.execution_mode);

        builder
            .execution_mode(mode)
            .threads(threads)
            .parallel_threshold(performance.parallel_threshold_blocks)
            .build()
            .map_err(|e| CliError::ConfigError(e.to_string()).into())
    }

    fn create_formatter(
        &self,
        format: OutputFormat,
        file: &CliConfig,
    ) -> Result<Box<dyn OutputFormatter>> {
        let writer: Box<dyn Write + Send + Sync> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
                format!("Failed to create output file: {}", path.display())
            })?)),
            None => Box::new(io::stdout()),
        };

        let include_metadata = self.include_metadata || file.output.include_metadata;
        Ok(match format {
            OutputFormat::Json => Box::new(JsonFormatter::new(
                writer,
                file.output.pretty_json,
                include_metadata,
            )),
            OutputFormat::Text => Box::new(TextFormatter::new(writer)),
            OutputFormat::Markdown => Box::new(MarkdownFormatter::new(writer)),
        })
    }

    /// Initialize logging based on verbosity level
    fn init_logging(&self) {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            // A logger may already be installed when run from tests
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(log_level),
            )
            .try_init();
        }
    }
}

fn process_file(processor: &PairingProcessor, path: &Path) -> Result<Output> {
    let blocks = FileReader::read_blocks(path)?;
    log::debug!("{}: {} blocks", path.display(), blocks.len());
    processor
        .process_blocks(&blocks)
        .map_err(|e| CliError::ProcessingError(format!("{}: {e}", path.display())).into())
}

fn describe_patterns(source: &PatternSource) -> String {
    match source {
        PatternSource::Builtin(name) => format!("built-in '{name}'"),
        PatternSource::File(path) => format!("file {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        args: ProcessArgs,
    }

    fn parse(args: &[&str]) -> ProcessArgs {
        let mut argv = vec!["capmatch"];
        argv.extend_from_slice(args);
        Harness::parse_from(argv).args
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = CliConfig::default();
        file.pairing.context_window_radius = Some(6);
        file.pairing.min_confidence = Some(0.2);
        file.performance.worker_threads = 2;

        let args = parse(&["-i", "doc.txt", "-w", "4", "--mode", "sequential"]);
        let config = args.build_config(&file).unwrap();
        let engine = config.engine();
        assert_eq!(engine.context_window_radius, 4);
        assert_eq!(engine.min_confidence, 0.2);
        assert_eq!(engine.threads, Some(2));
        assert_eq!(engine.execution_mode, ExecutionMode::Sequential);
    }

    #[test]
    fn test_preset_and_kind_filter() {
        let args = parse(&["-i", "doc.txt", "--preset", "precise", "--tables-only"]);
        let config = args.build_config(&CliConfig::default()).unwrap();
        assert_eq!(config.engine().context_window_radius, 2);
        assert!(!config.engine().include_figures);
        assert!(config.engine().include_tables);
    }

    #[test]
    fn test_pattern_source_precedence() {
        let mut file = CliConfig::default();
        file.pairing.patterns_file = Some(PathBuf::from("rules.toml"));

        let args = parse(&["-i", "doc.txt"]);
        let config = args.build_config(&file).unwrap();
        assert_eq!(
            config.patterns(),
            &PatternSource::File(PathBuf::from("rules.toml"))
        );

        let args = parse(&["-i", "doc.txt", "--builtin", "strict"]);
        let config = args.build_config(&file).unwrap();
        assert_eq!(
            config.patterns(),
            &PatternSource::Builtin("strict".to_string())
        );
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let args = parse(&["-i", "doc.txt", "-w", "0"]);
        let err = args.build_config(&CliConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigError(_))
        ));
    }

    #[test]
    fn test_conflicting_filters_rejected() {
        let result = Harness::try_parse_from([
            "capmatch",
            "-i",
            "doc.txt",
            "--figures-only",
            "--tables-only",
        ]);
        assert!(result.is_err());
    }
}
