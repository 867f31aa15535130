//! Error types for parsing, filtering and reading log sources.

use std::path::PathBuf;

use holescope_types::{RecordKind, UnknownField};

/// Why a single line could not be interpreted
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line has {found} token(s), a timestamp needs 3")]
    MissingTimestamp { found: usize },

    #[error("invalid timestamp '{text}'")]
    TimestampFormat {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("truncated {} line: needs {required} tokens, found {found}", kind_name(.kind))]
    TruncatedLine {
        /// `None` when the line ends before the dispatch token
        kind: Option<RecordKind>,
        required: usize,
        found: usize,
    },
}

fn kind_name(kind: &Option<RecordKind>) -> &'static str {
    kind.map(|k| k.as_str()).unwrap_or("unclassified")
}

/// A parse failure with the position and text of the offending line
#[derive(Debug, thiserror::Error)]
#[error("line {line_number}")]
pub struct LineError {
    /// 1-based line number within the source
    pub line_number: usize,
    /// The line as read, unescaped
    pub raw: String,
    #[source]
    pub source: ParseError,
}

/// Errors raised while building a filter predicate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown field '{0}', expected one of kind, result, domain, requester, upstream")]
    UnknownField(String),
}

impl From<UnknownField> for FilterError {
    fn from(err: UnknownField) -> Self {
        Self::UnknownField(err.0)
    }
}

/// Errors raised while reading a log file
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
