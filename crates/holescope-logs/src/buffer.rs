use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use holescope_types::{ArcRecord, Record, RecordKind};

/// Shared, ordered record sequence for one session.
///
/// Readers take a snapshot (a clone of the inner `Arc`), so a reload that
/// swaps in a new sequence never exposes a partially built one.
#[derive(Clone, Default)]
pub struct RecordLog {
    records: Arc<RwLock<Arc<Vec<ArcRecord>>>>,

    /// Bumped on every publish
    generation: Arc<AtomicU64>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a freshly loaded sequence, replacing the current one wholesale
    pub fn replace(&self, records: Vec<Record>) {
        let fresh: Vec<ArcRecord> = records.into_iter().map(Arc::new).collect();
        let count = fresh.len();
        *self.records.write() = Arc::new(fresh);
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(count, "record log replaced");
    }

    /// Append records read from a growing file
    pub fn extend(&self, records: Vec<Record>) {
        if records.is_empty() {
            return;
        }
        let mut guard = self.records.write();
        // Copies the outer vector only while a snapshot of it is still alive
        Arc::make_mut(&mut guard).extend(records.into_iter().map(Arc::new));
        drop(guard);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Current sequence, cheap to clone and safe to hold across publishes
    pub fn snapshot(&self) -> Arc<Vec<ArcRecord>> {
        Arc::clone(&self.records.read())
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if log is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Get record count per kind
    pub fn kind_counts(&self) -> KindCounts {
        let records = self.snapshot();
        let mut counts = KindCounts::default();
        for record in records.iter() {
            counts.counts[record.kind().ordinal()] += 1;
        }
        counts
    }
}

/// Counts per record kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KindCounts {
    counts: [usize; RecordKind::ALL.len()],
}

impl KindCounts {
    pub fn get(&self, kind: RecordKind) -> usize {
        self.counts[kind.ordinal()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Kinds with at least one record, in display order
    pub fn non_zero(&self) -> impl Iterator<Item = (RecordKind, usize)> + '_ {
        RecordKind::ALL
            .into_iter()
            .map(|k| (k, self.get(k)))
            .filter(|(_, n)| *n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineParser;

    fn parse(lines: &[&str]) -> Vec<Record> {
        LineParser::new().parse_lines(lines, 1).records
    }

    #[test]
    fn test_replace_publishes_new_generation() {
        let log = RecordLog::new();
        assert!(log.is_empty());
        let g0 = log.generation();

        log.replace(parse(&["Jan 2 03:04:05 dnsmasq[1]: read /etc/hosts - 2 names"]));
        assert_eq!(log.len(), 1);
        assert!(log.generation() > g0);
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let log = RecordLog::new();
        log.replace(parse(&["Jan 2 03:04:05 dnsmasq[1]: read /etc/hosts - 2 names"]));
        let before = log.snapshot();

        log.replace(Vec::new());
        assert_eq!(before.len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_extend_appends_in_order() {
        let log = RecordLog::new();
        log.replace(parse(&["Jan 2 03:04:05 dnsmasq[1]: query[A] a.test from 10.0.0.1"]));
        let held = log.snapshot();
        let g = log.generation();

        log.extend(parse(&["Jan 2 03:04:06 dnsmasq[1]: query[A] b.test from 10.0.0.1"]));
        let now = log.snapshot();
        assert_eq!(now.len(), 2);
        assert_eq!(now[1].domain(), "b.test");
        assert_eq!(held.len(), 1);
        assert!(log.generation() > g);

        log.extend(Vec::new());
        assert_eq!(log.generation(), g + 1);
    }

    #[test]
    fn test_kind_counts() {
        let log = RecordLog::new();
        log.replace(parse(&[
            "Jan 2 03:04:05 dnsmasq[1]: query[A] a.test from 10.0.0.1",
            "Jan 2 03:04:05 dnsmasq[1]: query[A] b.test from 10.0.0.1",
            "Jan 2 03:04:05 dnsmasq[1]: gravity blocked ads.test is 0.0.0.0",
        ]));
        let counts = log.kind_counts();
        assert_eq!(counts.get(RecordKind::QueryA), 2);
        assert_eq!(counts.get(RecordKind::Blocked), 1);
        assert_eq!(counts.get(RecordKind::Reply), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(
            counts.non_zero().collect::<Vec<_>>(),
            vec![(RecordKind::Blocked, 1), (RecordKind::QueryA, 2)]
        );
    }
}
