//! Shared types for holescope
//!
//! This crate contains the record model produced by the log parser and
//! consumed by the filter engine and the terminal UI.

use chrono::NaiveDateTime;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// Record kinds
// ============================================================================

/// Token position that decides the kind of a line
pub const DISPATCH_TOKEN: usize = 4;

/// Category a log line is classified into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Blocked,
    Read,
    #[serde(rename = "query-AAAA")]
    QueryAaaa,
    #[serde(rename = "query-A")]
    QueryA,
    #[serde(rename = "query-PTR")]
    QueryPtr,
    Cached,
    Forwarded,
    Reply,
    Unknown,
}

impl RecordKind {
    /// Every kind, in display order
    pub const ALL: [RecordKind; 9] = [
        Self::Blocked,
        Self::Read,
        Self::QueryAaaa,
        Self::QueryA,
        Self::QueryPtr,
        Self::Cached,
        Self::Forwarded,
        Self::Reply,
        Self::Unknown,
    ];

    /// Classify a dispatch token. Matching is exact; anything else is `Unknown`.
    pub fn from_keyword(token: &str) -> Self {
        match token {
            "gravity" => Self::Blocked,
            "read" => Self::Read,
            "query[AAAA]" => Self::QueryAaaa,
            "query[A]" => Self::QueryA,
            "query[PTR]" => Self::QueryPtr,
            "cached" => Self::Cached,
            "forwarded" => Self::Forwarded,
            "reply" => Self::Reply,
            _ => Self::Unknown,
        }
    }

    /// Canonical name, also the value matched by field filters on `kind`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::Read => "read",
            Self::QueryAaaa => "query-AAAA",
            Self::QueryA => "query-A",
            Self::QueryPtr => "query-PTR",
            Self::Cached => "cached",
            Self::Forwarded => "forwarded",
            Self::Reply => "reply",
            Self::Unknown => "unknown",
        }
    }

    /// Position of this kind in [`RecordKind::ALL`]
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::QueryAaaa | Self::QueryA | Self::QueryPtr)
    }

    /// Token positions of the structured fields for this kind
    pub fn layout(&self) -> FieldLayout {
        match self {
            // "gravity blocked" takes two tokens, shifting later fields by one
            Self::Blocked => FieldLayout {
                result: Some(8),
                domain: Some(6),
                ..FieldLayout::EMPTY
            },
            Self::Cached | Self::Reply => FieldLayout {
                result: Some(7),
                domain: Some(5),
                ..FieldLayout::EMPTY
            },
            Self::QueryAaaa | Self::QueryA | Self::QueryPtr => FieldLayout {
                domain: Some(5),
                requester: Some(7),
                ..FieldLayout::EMPTY
            },
            Self::Forwarded => FieldLayout {
                domain: Some(5),
                upstream: Some(7),
                ..FieldLayout::EMPTY
            },
            Self::Read | Self::Unknown => FieldLayout::EMPTY,
        }
    }

    /// Display color for this kind
    pub fn color(&self) -> Color {
        match self {
            Self::Blocked => Color::Red,
            Self::Read => Color::DarkGray,
            Self::QueryAaaa => Color::Blue,
            Self::QueryA => Color::Cyan,
            Self::QueryPtr => Color::Magenta,
            Self::Cached => Color::Green,
            Self::Forwarded => Color::Yellow,
            Self::Reply => Color::White,
            Self::Unknown => Color::Gray,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token index of each structured field for one kind (`None` = not present)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FieldLayout {
    pub result: Option<usize>,
    pub domain: Option<usize>,
    pub requester: Option<usize>,
    pub upstream: Option<usize>,
}

impl FieldLayout {
    pub const EMPTY: FieldLayout = FieldLayout {
        result: None,
        domain: None,
        requester: None,
        upstream: None,
    };

    /// Index of a field, `None` for `Kind` or for fields this kind lacks
    pub fn index_of(&self, field: Field) -> Option<usize> {
        match field {
            Field::Kind => None,
            Field::Result => self.result,
            Field::Domain => self.domain,
            Field::Requester => self.requester,
            Field::Upstream => self.upstream,
        }
    }

    /// Minimum token count a line of this kind must have
    pub fn required_tokens(&self) -> usize {
        [self.result, self.domain, self.requester, self.upstream]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(DISPATCH_TOKEN)
            + 1
    }
}

// ============================================================================
// Fields
// ============================================================================

/// A record field that can be filtered on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Kind,
    Result,
    Domain,
    Requester,
    Upstream,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Self::Kind,
        Self::Result,
        Self::Domain,
        Self::Requester,
        Self::Upstream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Result => "result",
            Self::Domain => "domain",
            Self::Requester => "requester",
            Self::Upstream => "upstream",
        }
    }

    /// Capitalized label for the detail pane and filter indicator
    pub fn label(&self) -> &'static str {
        match self {
            Self::Kind => "Kind",
            Self::Result => "Result",
            Self::Domain => "Domain",
            Self::Requester => "Requester",
            Self::Upstream => "Upstream",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a field name is not one of the known fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

// ============================================================================
// Records
// ============================================================================

/// Structured values pulled out of a line before the record is built
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub result: String,
    pub domain: String,
    pub requester: String,
    pub upstream: String,
}

/// Records are shared between the record log, filter results and the UI
pub type ArcRecord = Arc<Record>;

/// One interpreted log line. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    timestamp: NaiveDateTime,
    kind: RecordKind,
    result: String,
    domain: String,
    requester: String,
    upstream: String,
    raw: String,
}

impl Record {
    /// Build a record. Values for fields the kind does not carry are dropped,
    /// so a record never holds a field belonging to another kind.
    pub fn new(
        timestamp: NaiveDateTime,
        kind: RecordKind,
        fields: ExtractedFields,
        raw: String,
    ) -> Self {
        let layout = kind.layout();
        let keep = |index: Option<usize>, value: String| {
            if index.is_some() { value } else { String::new() }
        };

        Self {
            timestamp,
            kind,
            result: keep(layout.result, fields.result),
            domain: keep(layout.domain, fields.domain),
            requester: keep(layout.requester, fields.requester),
            upstream: keep(layout.upstream, fields.upstream),
            raw,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Original line with every `]` escaped as `[]`
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Value of a field as a string (`kind` yields its canonical name)
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Kind => self.kind.as_str(),
            Field::Result => &self.result,
            Field::Domain => &self.domain,
            Field::Requester => &self.requester,
            Field::Upstream => &self.upstream,
        }
    }

    /// Non-empty fields in detail-pane order. `kind` is always present.
    pub fn populated_fields(&self) -> Vec<(Field, &str)> {
        Field::ALL
            .into_iter()
            .map(|f| (f, self.field(f)))
            .filter(|(f, v)| *f == Field::Kind || !v.is_empty())
            .collect()
    }

    /// The line as written by the producer, with bracket escaping undone
    pub fn display_text(&self) -> String {
        self.raw.replace("[]", "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1972, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap()
    }

    #[test]
    fn test_keyword_dispatch() {
        assert_eq!(RecordKind::from_keyword("gravity"), RecordKind::Blocked);
        assert_eq!(RecordKind::from_keyword("query[AAAA]"), RecordKind::QueryAaaa);
        assert_eq!(RecordKind::from_keyword("query[A]"), RecordKind::QueryA);
        assert_eq!(RecordKind::from_keyword("query[PTR]"), RecordKind::QueryPtr);
        assert_eq!(RecordKind::from_keyword("query[MX]"), RecordKind::Unknown);
        assert_eq!(RecordKind::from_keyword("Cached"), RecordKind::Unknown);
    }

    #[test]
    fn test_required_tokens() {
        assert_eq!(RecordKind::Blocked.layout().required_tokens(), 9);
        assert_eq!(RecordKind::Reply.layout().required_tokens(), 8);
        assert_eq!(RecordKind::QueryA.layout().required_tokens(), 8);
        assert_eq!(RecordKind::Forwarded.layout().required_tokens(), 8);
        assert_eq!(RecordKind::Read.layout().required_tokens(), 5);
        assert_eq!(RecordKind::Unknown.layout().required_tokens(), 5);
    }

    #[test]
    fn test_record_drops_foreign_fields() {
        let fields = ExtractedFields {
            result: "1.2.3.4".to_string(),
            domain: "example.com".to_string(),
            requester: "10.0.0.1".to_string(),
            upstream: "8.8.8.8".to_string(),
        };
        let record = Record::new(ts(), RecordKind::Forwarded, fields, String::new());
        assert_eq!(record.domain(), "example.com");
        assert_eq!(record.upstream(), "8.8.8.8");
        assert_eq!(record.result(), "");
        assert_eq!(record.requester(), "");
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("domain".parse::<Field>(), Ok(Field::Domain));
        assert_eq!("Domain".parse::<Field>(), Err(UnknownField("Domain".to_string())));
    }

    #[test]
    fn test_display_text_unescapes() {
        let record = Record::new(
            ts(),
            RecordKind::Unknown,
            ExtractedFields::default(),
            "dnsmasq[1[]: a[[] b".to_string(),
        );
        assert_eq!(record.display_text(), "dnsmasq[1]: a[] b");
    }

    #[test]
    fn test_populated_fields() {
        let fields = ExtractedFields {
            domain: "example.com".to_string(),
            requester: "10.0.0.5".to_string(),
            ..Default::default()
        };
        let record = Record::new(ts(), RecordKind::QueryA, fields, String::new());
        assert_eq!(
            record.populated_fields(),
            vec![
                (Field::Kind, "query-A"),
                (Field::Domain, "example.com"),
                (Field::Requester, "10.0.0.5"),
            ]
        );
    }
}
