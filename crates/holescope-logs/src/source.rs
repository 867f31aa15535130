use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;

/// Contents of a log file at one point in time
#[derive(Debug, Default)]
pub struct FileSnapshot {
    /// Newline-terminated lines in file order, blank ones included
    pub lines: Vec<String>,
    /// Trailing text not yet ended by a newline
    pub partial: Option<String>,
    /// Bytes up to the last newline, where a follower should resume
    pub offset: u64,
}

impl FileSnapshot {
    /// Every line, the unfinished last one included
    pub fn into_all_lines(self) -> Vec<String> {
        let mut lines = self.lines;
        lines.extend(self.partial);
        lines
    }
}

/// Read an entire log file into lines
pub async fn read_all(path: &Path) -> Result<FileSnapshot, SourceError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // A line still being written stays out of `lines` so a follower can finish it
    let complete = bytes.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
    let lines = split_lines(&bytes[..complete]);
    let partial = (complete < bytes.len())
        .then(|| String::from_utf8_lossy(&bytes[complete..]).into_owned());
    tracing::debug!(path = %path.display(), lines = lines.len(), partial = partial.is_some(), "read log file");

    Ok(FileSnapshot {
        lines,
        partial,
        offset: complete as u64,
    })
}

/// Split raw bytes into lines, dropping `\r` terminators. Blank lines are
/// kept so line numbers match the file.
fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Events sent by a running tailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// Complete lines appended since the last event, blank ones included
    Lines(Vec<String>),
    /// The file shrank (rotation or truncation); the tailer has stopped
    Truncated,
    /// The file could not be read; the tailer keeps polling
    Error(String),
}

/// Follows a log file, reporting appended lines
pub struct LogTailer {
    /// Cancellation token for stopping the poll loop
    cancel: CancellationToken,

    /// Poll task handle
    #[allow(dead_code)]
    task: tokio::task::JoinHandle<()>,
}

impl LogTailer {
    /// Start following `path` from byte `offset`
    pub fn spawn(
        path: PathBuf,
        offset: u64,
        poll_interval: Duration,
        tx: mpsc::UnboundedSender<SourceEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut follower = Follower::new(path, offset);
                let mut ticker = tokio::time::interval(poll_interval);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,

                        _ = ticker.tick() => {
                            let event = follower.poll().await;
                            let stop = matches!(event, Some(SourceEvent::Truncated));
                            if let Some(event) = event
                                && tx.send(event).is_err()
                            {
                                // Receiver gone, nobody is listening
                                break;
                            }
                            if stop {
                                break;
                            }
                        }
                    }
                }
            })
        };

        Self { cancel, task }
    }

    /// Stop following
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LogTailer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Read position and pending partial line for one followed file
struct Follower {
    path: PathBuf,
    offset: u64,
    partial: Vec<u8>,
    failing: bool,
}

impl Follower {
    fn new(path: PathBuf, offset: u64) -> Self {
        Self {
            path,
            offset,
            partial: Vec::new(),
            failing: false,
        }
    }

    async fn poll(&mut self) -> Option<SourceEvent> {
        match self.read_appended().await {
            Ok(event) => {
                self.failing = false;
                event
            }
            Err(e) => {
                // Report once per outage, rotation usually recreates the file
                if self.failing {
                    return None;
                }
                self.failing = true;
                tracing::error!(path = %self.path.display(), "tail failed: {}", e);
                Some(SourceEvent::Error(format!("{}: {}", self.path.display(), e)))
            }
        }
    }

    async fn read_appended(&mut self) -> std::io::Result<Option<SourceEvent>> {
        let len = tokio::fs::metadata(&self.path).await?.len();

        if len < self.offset {
            tracing::debug!(path = %self.path.display(), len, offset = self.offset, "file truncated");
            return Ok(Some(SourceEvent::Truncated));
        }
        if len == self.offset {
            return Ok(None);
        }

        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut appended = Vec::with_capacity((len - self.offset) as usize);
        let read = file.read_to_end(&mut appended).await?;
        self.offset += read as u64;
        self.partial.extend_from_slice(&appended);

        // Hold back bytes after the last newline until the line is finished
        let Some(last_newline) = self.partial.iter().rposition(|b| *b == b'\n') else {
            return Ok(None);
        };
        let complete: Vec<u8> = self.partial.drain(..=last_newline).collect();
        let lines = split_lines(&complete);

        if lines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SourceEvent::Lines(lines)))
        }
    }
}
