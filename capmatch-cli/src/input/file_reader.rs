//! File reading utilities

use anyhow::{Context, Result};
use capmatch_api::{dto, TextBlock};
use std::fs;
use std::path::Path;

/// File reader with UTF-8 validation
pub struct FileReader;

impl FileReader {
    /// Read a file as UTF-8 text
    pub fn read_text(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(content)
    }

    /// Read a file as document blocks.
    ///
    /// `.json` files hold an array of blocks; anything else is plain text
    /// with form feeds between pages and blank lines between blocks.
    pub fn read_blocks(path: &Path) -> Result<Vec<TextBlock>> {
        let content = Self::read_text(path)?;
        if Self::is_json(path) {
            dto::blocks_from_json(&content)
                .with_context(|| format!("Invalid block JSON in {}", path.display()))
        } else {
            Ok(dto::blocks_from_text(&content))
        }
    }

    /// Whether a path names a JSON block file
    pub fn is_json(path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}
