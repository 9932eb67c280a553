//! Built-in rule tables
//!
//! Tables are embedded at compile time and compiled once on first access.

use std::sync::OnceLock;

use super::PatternSet;
use crate::error::PatternError;

/// Name of the table used when none is requested
pub const DEFAULT_SET: &str = "default";

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("default", include_str!("../../configs/patterns/default.toml")),
    ("strict", include_str!("../../configs/patterns/strict.toml")),
];

/// Compiled built-in tables, or the message of the first load failure
static BUILTIN: OnceLock<Vec<(&'static str, Result<PatternSet, String>)>> = OnceLock::new();

fn builtins() -> &'static [(&'static str, Result<PatternSet, String>)] {
    BUILTIN.get_or_init(|| {
        BUILTIN_SOURCES
            .iter()
            .map(|(name, source)| {
                let set = PatternSet::from_toml_str(source).map_err(|e| e.to_string());
                if let Err(message) = &set {
                    log::error!("built-in rule table '{name}' failed to load: {message}");
                }
                (*name, set)
            })
            .collect()
    })
}

/// Look up a built-in table by name
pub fn get_builtin(name: &str) -> Result<PatternSet, PatternError> {
    let (_, set) = builtins()
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .ok_or_else(|| PatternError::UnknownBuiltin(name.to_string()))?;

    set.clone().map_err(PatternError::Parse)
}

/// Names and descriptions of the built-in tables
pub fn list_builtin() -> Vec<(&'static str, String)> {
    builtins()
        .iter()
        .map(|(name, set)| {
            let description = match set {
                Ok(set) => set.description().to_string(),
                Err(message) => format!("unavailable: {message}"),
            };
            (*name, description)
        })
        .collect()
}
