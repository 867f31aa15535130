use anyhow::Result;
use tokio::sync::mpsc;

use holescope_logs::{LineParser, LogTailer, RecordLog, SourceEvent};
use holescope_tui::AppState;

use crate::config::Config;
use crate::loader::{Loaded, append_lines, load_file};

/// A running follower and the channel it reports on
pub struct Follow {
    tailer: LogTailer,
    events: mpsc::UnboundedReceiver<SourceEvent>,
}

impl Follow {
    fn start(config: &Config, offset: u64) -> Self {
        // A fresh channel per follower, so lines from a replaced one are never seen
        let (tx, events) = mpsc::unbounded_channel();
        let tailer = LogTailer::spawn(config.log_path.clone(), offset, config.poll_interval(), tx);
        Self { tailer, events }
    }
}

pub async fn next_source_event(follow: &mut Option<Follow>) -> Option<SourceEvent> {
    match follow {
        Some(follow) => follow.events.recv().await,
        None => std::future::pending().await,
    }
}

/// Everything the main loop needs to (re)load the file
pub struct Session {
    config: Config,
    parser: LineParser,
    pub log: RecordLog,
    pub follow: Option<Follow>,
    next_line: usize,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            parser: LineParser::with_reference_year(config.reference_year),
            config,
            log: RecordLog::new(),
            follow: None,
            next_line: 1,
        }
    }

    /// Full load; on success the follower (if any) restarts at the new end of file
    pub async fn load(&mut self) -> Result<Loaded> {
        let loaded = load_file(
            &self.config.log_path,
            &self.parser,
            self.config.malformed_lines,
            self.config.follow,
            &self.log,
        )
        .await?;

        self.next_line = loaded.lines_read + 1;
        if self.config.follow {
            self.follow = Some(Follow::start(&self.config, loaded.offset));
        }
        Ok(loaded)
    }

    /// User-requested reload. A failure leaves the current follower running.
    pub async fn reload(&mut self, state: &mut AppState) {
        if let Err(e) = self.try_reload(state).await {
            tracing::error!("reload failed: {:#}", e);
            state.show_message(format!("Reload failed: {:#}", e));
        }
    }

    /// Reload after the follower saw the file shrink. That follower has already
    /// stopped, so a failure here ends following until the next manual reload.
    pub async fn reload_after_truncation(&mut self, state: &mut AppState) {
        if let Err(e) = self.try_reload(state).await {
            tracing::error!("reload after truncation failed: {:#}", e);
            self.follow = None;
            state.follow = false;
            state.show_message(format!(
                "Reload failed: {:#}; follow stopped, press r to retry",
                e
            ));
        }
    }

    async fn try_reload(&mut self, state: &mut AppState) -> Result<()> {
        let loaded = self.load().await?;
        state.loaded(loaded.skipped);
        state.follow = self.follow.is_some();
        state.show_message(format!("Loaded {} records", self.log.len()));
        Ok(())
    }

    pub fn append(&mut self, lines: &[String], state: &mut AppState) {
        let first = self.next_line;
        self.next_line += lines.len();

        match append_lines(lines, first, &self.parser, self.config.malformed_lines, &self.log) {
            Ok(skipped) => state.skipped_lines += skipped,
            Err(e) => {
                // Stop following rather than drop lines silently
                if let Some(follow) = self.follow.take() {
                    follow.tailer.stop();
                }
                state.follow = false;
                state.show_message(format!("{:#}", e));
            }
        }
    }

    pub fn stop(&self) {
        if let Some(follow) = &self.follow {
            follow.tailer.stop();
        }
    }
}
