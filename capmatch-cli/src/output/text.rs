//! Plain text output formatter

use super::OutputFormatter;
use anyhow::Result;
use capmatch_api::Output;
use std::io::Write;

/// Plain text formatter - outputs each pair as a prompt-ready block
pub struct TextFormatter<W: Write> {
    writer: W,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send + Sync> OutputFormatter for TextFormatter<W> {
    fn format_document(&mut self, source: &str, output: &Output) -> Result<()> {
        writeln!(self.writer, "# {source}")?;
        for pair in &output.pairs {
            writeln!(
                self.writer,
                "[{} {}] confidence {:.3}, {} context, {} references",
                pair.caption.kind,
                pair.caption.number,
                pair.confidence,
                pair.primary_context.len(),
                pair.cross_references.len()
            )?;
            writeln!(self.writer, "{}", pair.combined_text)?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
