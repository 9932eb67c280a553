//! Error types for the pairing core

use thiserror::Error;

/// Errors raised while loading or validating a caption rule table
#[derive(Debug, Error)]
pub enum PatternError {
    /// The TOML document could not be parsed
    #[error("failed to parse rule table: {0}")]
    Parse(String),

    /// A rule table file could not be read
    #[error("failed to read rule table {path}: {message}")]
    Io {
        /// Path of the rule table
        path: String,
        /// Underlying I/O message
        message: String,
    },

    /// A rule's regular expression does not compile
    #[error("rule '{id}' has an invalid pattern: {source}")]
    InvalidRegex {
        /// Rule id
        id: String,
        /// Compiler error
        #[source]
        source: regex::Error,
    },

    /// A rule's pattern lacks a mandatory named group
    #[error("rule '{id}' is missing the named group '{group}'")]
    MissingGroup {
        /// Rule id
        id: String,
        /// Name of the missing group
        group: &'static str,
    },

    /// Two rules share an id
    #[error("duplicate rule id '{0}'")]
    DuplicateId(String),

    /// A rule's specificity is not a positive finite number
    #[error("rule '{id}' has invalid specificity {value}")]
    InvalidSpecificity {
        /// Rule id
        id: String,
        /// Offending value
        value: f64,
    },

    /// The table defines no caption rules
    #[error("rule table defines no caption rules")]
    NoCaptionRules,

    /// No built-in table with the requested name
    #[error("unknown built-in rule table '{0}'")]
    UnknownBuiltin(String),
}

/// A non-fatal fault in one candidate's pipeline.
///
/// The candidate is dropped and the fault is reported as a diagnostic;
/// processing of the remaining candidates continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateFault {
    /// The match span does not fit in the source block's text
    #[error("span {start}..{end} exceeds block {position} of length {len}")]
    SpanOutOfRange {
        /// Position of the source block
        position: usize,
        /// Span start
        start: usize,
        /// Span end
        end: usize,
        /// Text length in bytes
        len: usize,
    },

    /// The match span splits a UTF-8 character
    #[error("span {start}..{end} is not on a character boundary in block {position}")]
    SpanNotOnCharBoundary {
        /// Position of the source block
        position: usize,
        /// Span start
        start: usize,
        /// Span end
        end: usize,
    },
}

/// Fatal errors raised while associating context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A block reference no longer resolves to the block it was taken from
    #[error("block reference {position} (page {page}, index {index}) does not resolve")]
    MalformedBlockReference {
        /// Position in the input sequence
        position: usize,
        /// Expected page
        page: u32,
        /// Expected index
        index: u32,
    },
}
