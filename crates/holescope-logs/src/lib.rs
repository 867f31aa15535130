//! Log processing for holescope
//!
//! This crate turns raw dnsmasq/Pi-hole log lines into records, filters
//! record sequences, and reads or follows the log file.

mod buffer;
mod error;
mod filter;
mod parser;
mod source;

pub use buffer::{KindCounts, RecordLog};
pub use error::{FilterError, LineError, ParseError, SourceError};
pub use filter::{Predicate, RecordFilter, filter};
pub use parser::{
    DEFAULT_REFERENCE_YEAR, LineParser, MalformedLinePolicy, ParsedBatch, escape_brackets,
};
pub use source::{FileSnapshot, LogTailer, SourceEvent, read_all};

// Re-export types used in our public API
pub use holescope_types::{ArcRecord, Field, Record, RecordKind};
