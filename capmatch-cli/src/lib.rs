//! capmatch CLI library
//!
//! Commands, configuration, input resolution and output formatting for the
//! `capmatch` binary.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;

pub use error::{CliError, CliResult};
