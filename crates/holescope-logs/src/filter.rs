use holescope_types::{ArcRecord, Field, Record};

use crate::error::FilterError;

/// A pure test over a single record
pub trait Predicate {
    fn matches(&self, record: &Record) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&Record) -> bool,
{
    fn matches(&self, record: &Record) -> bool {
        self(record)
    }
}

/// Return the records matching `predicate`, in their original order.
///
/// The input is left untouched; matches share the input's `Arc`s.
pub fn filter<P>(records: &[ArcRecord], predicate: &P) -> Vec<ArcRecord>
where
    P: Predicate + ?Sized,
{
    records
        .iter()
        .filter(|r| predicate.matches(r))
        .cloned()
        .collect()
}

/// The filters an operator can set from the UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordFilter {
    /// Substring of the escaped raw line, case-sensitive
    TextContains(String),
    /// Exact match on one field; an empty value matches records lacking it
    FieldEquals { field: Field, value: String },
}

impl RecordFilter {
    pub fn text_contains(needle: impl Into<String>) -> Self {
        Self::TextContains(needle.into())
    }

    pub fn field_equals(field: Field, value: impl Into<String>) -> Self {
        Self::FieldEquals {
            field,
            value: value.into(),
        }
    }

    /// Build a field filter from a field name, rejecting unknown names up front
    pub fn field_named(name: &str, value: impl Into<String>) -> Result<Self, FilterError> {
        let field = name.parse::<Field>()?;
        Ok(Self::field_equals(field, value))
    }

    /// Human readable description for the filter indicator
    pub fn label(&self) -> String {
        match self {
            Self::TextContains(needle) => format!("Text search: {}", needle),
            Self::FieldEquals { field, value } => format!("{}: {}", field.label(), value),
        }
    }

    /// Byte ranges of the search text within a record's display text,
    /// for highlighting. The needle is unescaped the same way the text is.
    pub fn find_matches(&self, display_text: &str) -> Vec<(usize, usize)> {
        match self {
            Self::TextContains(needle) if !needle.is_empty() => {
                let needle = needle.replace("[]", "]");
                display_text
                    .match_indices(needle.as_str())
                    .map(|(start, m)| (start, start + m.len()))
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

impl Predicate for RecordFilter {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::TextContains(needle) => record.raw().contains(needle.as_str()),
            Self::FieldEquals { field, value } => record.field(*field) == value,
        }
    }
}
