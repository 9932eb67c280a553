//! capmatch command-line entry point

use anyhow::Result;
use capmatch_cli::commands::Commands;
use clap::Parser;

/// Pair figure and table captions with the text that describes them
#[derive(Debug, Parser)]
#[command(name = "capmatch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    Cli::parse().command.execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
