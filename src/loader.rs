use std::path::Path;

use anyhow::{Context, Result};

use holescope_logs::{LineParser, MalformedLinePolicy, RecordLog, read_all};

/// Result of a full load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loaded {
    /// Byte offset a follower should start from
    pub offset: u64,
    /// Lines consumed, for numbering appended lines
    pub lines_read: usize,
    /// Malformed lines dropped
    pub skipped: usize,
}

/// Read and parse the whole file, then publish it in one swap.
///
/// When `follow` is set an unfinished last line is left for the follower,
/// which reads it once the writer ends it. Otherwise it is parsed with the rest.
/// Nothing is published when reading fails or the policy aborts.
pub async fn load_file(
    path: &Path,
    parser: &LineParser,
    policy: MalformedLinePolicy,
    follow: bool,
    log: &RecordLog,
) -> Result<Loaded> {
    let snapshot = read_all(path).await?;
    let offset = snapshot.offset;
    let lines = if follow {
        snapshot.lines
    } else {
        snapshot.into_all_lines()
    };

    let batch = parser
        .parse_lines(&lines, 1)
        .apply(policy)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let loaded = Loaded {
        offset,
        lines_read: batch.lines_read,
        skipped: batch.errors.len(),
    };
    tracing::debug!(
        path = %path.display(),
        records = batch.records.len(),
        skipped = loaded.skipped,
        "loaded log"
    );

    log.replace(batch.records);
    Ok(loaded)
}

/// Parse lines appended to a followed file and add them to the log.
/// Returns how many malformed lines were dropped.
pub fn append_lines(
    lines: &[String],
    first_line_number: usize,
    parser: &LineParser,
    policy: MalformedLinePolicy,
    log: &RecordLog,
) -> Result<usize> {
    let batch = parser
        .parse_lines(lines, first_line_number)
        .apply(policy)
        .context("Malformed line in followed file")?;

    let skipped = batch.errors.len();
    log.extend(batch.records);
    Ok(skipped)
}
