use chrono::NaiveDateTime;
use serde::Deserialize;

use holescope_types::{DISPATCH_TOKEN, ExtractedFields, Field, Record, RecordKind};

use crate::error::{LineError, ParseError, Result};

/// Year combined with the year-less syslog stamp. A leap year, so `Feb 29` parses.
pub const DEFAULT_REFERENCE_YEAR: i32 = 1972;

/// Number of leading tokens that make up the timestamp ("Jan 2 03:04:05")
const TIMESTAMP_TOKENS: usize = 3;

/// Layout of the reconstructed timestamp, prefixed with the reference year
const TIMESTAMP_FORMAT: &str = "%Y %b %e %H:%M:%S";

/// Parser for dnsmasq/Pi-hole log lines
#[derive(Clone, Copy, Debug)]
pub struct LineParser {
    reference_year: i32,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    pub fn new() -> Self {
        Self::with_reference_year(DEFAULT_REFERENCE_YEAR)
    }

    /// Create a parser that stamps records with the given year
    pub fn with_reference_year(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Parse a raw log line into a Record
    pub fn parse(&self, raw: &str) -> Result<Record> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let timestamp = self.parse_timestamp(&tokens)?;

        let kind = match tokens.get(DISPATCH_TOKEN) {
            Some(token) => RecordKind::from_keyword(token),
            None => {
                return Err(ParseError::TruncatedLine {
                    kind: None,
                    required: DISPATCH_TOKEN + 1,
                    found: tokens.len(),
                });
            }
        };

        let layout = kind.layout();
        let required = layout.required_tokens();
        if tokens.len() < required {
            return Err(ParseError::TruncatedLine {
                kind: Some(kind),
                required,
                found: tokens.len(),
            });
        }

        let take = |field: Field| {
            layout
                .index_of(field)
                .and_then(|i| tokens.get(i))
                .map(|t| t.to_string())
                .unwrap_or_default()
        };

        let fields = ExtractedFields {
            result: take(Field::Result),
            domain: take(Field::Domain),
            requester: take(Field::Requester),
            upstream: take(Field::Upstream),
        };

        Ok(Record::new(timestamp, kind, fields, escape_brackets(raw)))
    }

    /// Rebuild the stamp from the first three tokens and parse it
    fn parse_timestamp(&self, tokens: &[&str]) -> Result<NaiveDateTime> {
        if tokens.len() < TIMESTAMP_TOKENS {
            return Err(ParseError::MissingTimestamp {
                found: tokens.len(),
            });
        }

        let text = tokens[..TIMESTAMP_TOKENS].join(" ");
        NaiveDateTime::parse_from_str(
            &format!("{} {}", self.reference_year, text),
            TIMESTAMP_FORMAT,
        )
        .map_err(|source| ParseError::TimestampFormat { text, source })
    }

    /// Parse a sequence of physical lines, collecting failures instead of stopping.
    ///
    /// `first_line_number` is the 1-based number of the first line, so
    /// appended batches keep numbering where the previous one ended.
    pub fn parse_lines<I, S>(&self, lines: I, first_line_number: usize) -> ParsedBatch
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = ParsedBatch::default();

        for (offset, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            batch.lines_read += 1;

            // Blank lines keep their place in the numbering but are not records
            if line.trim().is_empty() {
                continue;
            }
            match self.parse(line) {
                Ok(record) => batch.records.push(record),
                Err(source) => batch.errors.push(LineError {
                    line_number: first_line_number + offset,
                    raw: line.to_string(),
                    source,
                }),
            }
        }

        batch
    }
}

/// Escape every `]` as `[]` so bracket-markup renderers show it literally
pub fn escape_brackets(line: &str) -> String {
    line.replace(']', "[]")
}

/// What a load does when it meets a line it cannot parse
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedLinePolicy {
    /// Drop the line, keep going
    #[default]
    Skip,
    /// Fail the whole load on the first bad line
    Abort,
}

/// Outcome of parsing a batch of lines
#[derive(Debug, Default)]
pub struct ParsedBatch {
    /// Successfully parsed records, in input order
    pub records: Vec<Record>,
    /// Lines that failed, in input order
    pub errors: Vec<LineError>,
    /// Physical lines consumed, blank ones included
    pub lines_read: usize,
}

impl ParsedBatch {
    /// Apply a malformed-line policy. Skipped lines are logged.
    pub fn apply(self, policy: MalformedLinePolicy) -> std::result::Result<Self, LineError> {
        match policy {
            MalformedLinePolicy::Abort => match self.errors.into_iter().next() {
                Some(first) => Err(first),
                None => Ok(Self {
                    errors: Vec::new(),
                    ..self
                }),
            },
            MalformedLinePolicy::Skip => {
                for err in &self.errors {
                    tracing::warn!(line = err.line_number, raw = %err.raw, "skipping malformed line: {}", err.source);
                }
                Ok(self)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const PREFIX: &str = "Jan 2 03:04:05 dnsmasq[1]:";

    fn parse(body: &str) -> Record {
        LineParser::new().parse(&format!("{} {}", PREFIX, body)).unwrap()
    }

    fn assert_fields(record: &Record, result: &str, domain: &str, requester: &str, upstream: &str) {
        assert_eq!(record.result(), result);
        assert_eq!(record.domain(), domain);
        assert_eq!(record.requester(), requester);
        assert_eq!(record.upstream(), upstream);
    }

    #[test]
    fn test_parse_query_a() {
        let record = parse("query[A] example.com from 10.0.0.5");
        assert_eq!(record.kind(), RecordKind::QueryA);
        assert_fields(&record, "", "example.com", "10.0.0.5", "");
    }

    #[test]
    fn test_parse_query_aaaa_and_ptr() {
        let record = parse("query[AAAA] ipv6.example.com from 10.0.0.7");
        assert_eq!(record.kind(), RecordKind::QueryAaaa);
        assert_fields(&record, "", "ipv6.example.com", "10.0.0.7", "");

        let record = parse("query[PTR] 5.0.0.10.in-addr.arpa from 127.0.0.1");
        assert_eq!(record.kind(), RecordKind::QueryPtr);
        assert_fields(&record, "", "5.0.0.10.in-addr.arpa", "127.0.0.1", "");
    }

    #[test]
    fn test_parse_blocked() {
        let record = parse("gravity blocked example.org is 0.0.0.0");
        assert_eq!(record.kind(), RecordKind::Blocked);
        assert_fields(&record, "0.0.0.0", "example.org", "", "");
    }

    #[test]
    fn test_parse_forwarded() {
        let record = parse("forwarded example.com to 1.1.1.1");
        assert_eq!(record.kind(), RecordKind::Forwarded);
        assert_fields(&record, "", "example.com", "", "1.1.1.1");
    }

    #[test]
    fn test_parse_cached_and_reply() {
        let record = parse("cached example.com is 93.184.216.34");
        assert_eq!(record.kind(), RecordKind::Cached);
        assert_fields(&record, "93.184.216.34", "example.com", "", "");

        let record = parse("reply example.com is <CNAME>");
        assert_eq!(record.kind(), RecordKind::Reply);
        assert_fields(&record, "<CNAME>", "example.com", "", "");
    }

    #[test]
    fn test_parse_read_has_no_fields() {
        let record = parse("read /etc/hosts - 2 names");
        assert_eq!(record.kind(), RecordKind::Read);
        assert_fields(&record, "", "", "", "");
    }

    #[test]
    fn test_parse_unknown_keeps_raw() {
        let line = "Jan 2 03:04:05 dnsmasq[1]: config error is REFUSED (EDE: not ready)";
        let record = LineParser::new().parse(line).unwrap();
        assert_eq!(record.kind(), RecordKind::Unknown);
        assert_fields(&record, "", "", "", "");
        assert_eq!(record.raw(), "Jan 2 03:04:05 dnsmasq[1[]: config error is REFUSED (EDE: not ready)");
    }

    #[test]
    fn test_parse_timestamp() {
        let record = parse("query[A] example.com from 10.0.0.5");
        let ts = record.timestamp();
        assert_eq!(ts.year(), DEFAULT_REFERENCE_YEAR);
        assert_eq!((ts.month(), ts.day()), (1, 2));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (3, 4, 5));
    }

    #[test]
    fn test_parse_space_padded_day() {
        // syslog pads single-digit days with a second space
        let line = "Feb  9 23:59:01 dnsmasq[812]: query[A] example.com from 10.0.0.5";
        let record = LineParser::with_reference_year(2024).parse(line).unwrap();
        assert_eq!(record.timestamp().year(), 2024);
        assert_eq!(record.timestamp().day(), 9);
        assert_eq!(record.raw(), "Feb  9 23:59:01 dnsmasq[812[]: query[A[] example.com from 10.0.0.5");
    }

    #[test]
    fn test_parse_leap_day_with_default_year() {
        let line = "Feb 29 00:00:00 dnsmasq[1]: reply example.com is 1.2.3.4";
        assert!(LineParser::new().parse(line).is_ok());
        let err = LineParser::with_reference_year(2023).parse(line).unwrap_err();
        assert!(matches!(err, ParseError::TimestampFormat { .. }));
    }

    #[test]
    fn test_bad_timestamp() {
        let err = LineParser::new()
            .parse("Foo 2 03:04:05 dnsmasq[1]: query[A] example.com from 10.0.0.5")
            .unwrap_err();
        match err {
            ParseError::TimestampFormat { text, .. } => assert_eq!(text, "Foo 2 03:04:05"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_timestamp() {
        let err = LineParser::new().parse("Jan 2").unwrap_err();
        assert!(matches!(err, ParseError::MissingTimestamp { found: 2 }));

        let err = LineParser::new().parse("").unwrap_err();
        assert!(matches!(err, ParseError::MissingTimestamp { found: 0 }));
    }

    #[test]
    fn test_truncated_lines() {
        let parser = LineParser::new();

        let err = parser.parse("Jan 2 03:04:05 dnsmasq[1]:").unwrap_err();
        assert!(matches!(
            err,
            ParseError::TruncatedLine { kind: None, required: 5, found: 4 }
        ));

        let err = parser
            .parse("Jan 2 03:04:05 dnsmasq[1]: gravity blocked example.org is")
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::TruncatedLine { kind: Some(RecordKind::Blocked), required: 9, found: 8 }
        ));

        let err = parser.parse("Jan 2 03:04:05 dnsmasq[1]: query[A] example.com").unwrap_err();
        assert!(matches!(
            err,
            ParseError::TruncatedLine { kind: Some(RecordKind::QueryA), required: 8, .. }
        ));
    }

    #[test]
    fn test_short_read_and_unknown_lines_parse() {
        let parser = LineParser::new();
        let record = parser.parse("Jan 2 03:04:05 dnsmasq[1]: read").unwrap();
        assert_eq!(record.kind(), RecordKind::Read);
        let record = parser.parse("Jan 2 03:04:05 dnsmasq[1]: started").unwrap();
        assert_eq!(record.kind(), RecordKind::Unknown);
    }

    #[test]
    fn test_escaping_leaves_no_bare_bracket() {
        let line = "Jan 2 03:04:05 dnsmasq[1]: query[AAAA] a]]b.example from ]";
        let record = LineParser::new().parse(line).unwrap();
        let raw = record.raw();
        for (i, _) in raw.match_indices(']') {
            assert_eq!(&raw[i - 1..i], "[", "bare ] at {i} in {raw}");
        }
        assert_eq!(record.display_text(), line);
    }

    #[test]
    fn test_parse_lines_continues_past_errors() {
        let lines = [
            "Jan 2 03:04:05 dnsmasq[1]: query[A] example.com from 10.0.0.5",
            "garbage",
            "Jan 2 03:04:06 dnsmasq[1]: forwarded example.com to 1.1.1.1",
            "Jan 2 03:04:07 dnsmasq[1]: reply example.com",
            "Jan 2 03:04:08 dnsmasq[1]: reply example.com is 1.2.3.4",
        ];
        let batch = LineParser::new().parse_lines(lines, 10);

        assert_eq!(batch.lines_read, 5);
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.errors.len(), 2);
        assert_eq!(batch.errors[0].line_number, 11);
        assert_eq!(batch.errors[0].raw, "garbage");
        assert_eq!(batch.errors[1].line_number, 13);
        assert_eq!(batch.records[2].result(), "1.2.3.4");
    }

    #[test]
    fn test_parse_lines_numbers_physical_lines() {
        let lines = [
            "Jan 2 03:04:05 dnsmasq[1]: query[A] example.com from 10.0.0.5",
            "",
            "   ",
            "broken line",
        ];
        let batch = LineParser::new().parse_lines(lines, 1);

        assert_eq!(batch.lines_read, 4);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].line_number, 4);
        assert_eq!(batch.errors[0].raw, "broken line");
    }

    #[test]
    fn test_policy_abort_returns_first_error() {
        let lines = ["bad one", "Jan 2 03:04:05 dnsmasq[1]: read /etc/hosts", "bad two"];
        let batch = LineParser::new().parse_lines(lines, 1);
        let err = batch.apply(MalformedLinePolicy::Abort).unwrap_err();
        assert_eq!(err.line_number, 1);
        assert_eq!(err.raw, "bad one");
    }

    #[test]
    fn test_policy_skip_keeps_records() {
        let lines = ["bad one", "Jan 2 03:04:05 dnsmasq[1]: read /etc/hosts"];
        let batch = LineParser::new()
            .parse_lines(lines, 1)
            .apply(MalformedLinePolicy::Skip)
            .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.errors.len(), 1);
    }
}
