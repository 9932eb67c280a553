//! JSON output formatter

use super::OutputFormatter;
use anyhow::Result;
use capmatch_api::{dto::Metadata, Output, PairDTO, StatsDTO};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// JSON formatter - outputs one report per document as a JSON array
pub struct JsonFormatter<W: Write> {
    writer: W,
    pretty: bool,
    include_metadata: bool,
    documents: Vec<DocumentReport>,
}

/// Data structure for JSON output
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Input path
    pub source: String,
    /// Pairs in document order
    pub pairs: Vec<PairDTO>,
    /// Aggregate statistics
    pub stats: StatsDTO,
    /// Timing and mode, only on request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W, pretty: bool, include_metadata: bool) -> Self {
        Self {
            writer,
            pretty,
            include_metadata,
            documents: Vec::new(),
        }
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn format_document(&mut self, source: &str, output: &Output) -> Result<()> {
        self.documents.push(DocumentReport {
            source: source.to_string(),
            pairs: output.pairs.clone(),
            stats: output.stats.clone(),
            metadata: self.include_metadata.then(|| output.metadata.clone()),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &self.documents)?;
        } else {
            serde_json::to_writer(&mut self.writer, &self.documents)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
