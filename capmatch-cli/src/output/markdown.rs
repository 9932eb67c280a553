//! Markdown output formatter

use super::OutputFormatter;
use anyhow::Result;
use capmatch_api::{BlockDTO, Output};
use std::io::Write;

/// Markdown formatter - outputs a section per document and per pair
pub struct MarkdownFormatter<W: Write> {
    writer: W,
    pair_count: usize,
}

impl<W: Write> MarkdownFormatter<W> {
    /// Create a new markdown formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pair_count: 0,
        }
    }

    fn write_blocks(&mut self, title: &str, blocks: &[BlockDTO]) -> Result<()> {
        if blocks.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "**{title}**")?;
        writeln!(self.writer)?;
        for block in blocks {
            let text = block.text.split_whitespace().collect::<Vec<_>>().join(" ");
            writeln!(self.writer, "- (p.{}) {text}", block.page + 1)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write + Send + Sync> OutputFormatter for MarkdownFormatter<W> {
    fn format_document(&mut self, source: &str, output: &Output) -> Result<()> {
        writeln!(self.writer, "## {source}")?;
        writeln!(self.writer)?;
        for pair in &output.pairs {
            self.pair_count += 1;
            let caption = &pair.caption;
            let marker = match caption.kind.as_str() {
                "table" => "Table",
                _ => "Figure",
            };
            if caption.label.is_empty() {
                writeln!(self.writer, "### {marker} {}", caption.number)?;
            } else {
                writeln!(self.writer, "### {marker} {}: {}", caption.number, caption.label)?;
            }
            writeln!(
                self.writer,
                "*page {}, confidence {:.3}*",
                caption.page + 1,
                pair.confidence
            )?;
            writeln!(self.writer)?;
            self.write_blocks("Context", &pair.primary_context)?;
            self.write_blocks("References", &pair.cross_references)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "---")?;
        writeln!(self.writer, "*Total pairs: {}*", self.pair_count)?;
        self.writer.flush()?;
        Ok(())
    }
}
