use std::sync::Arc;

use ratatui::widgets::{ListState, TableState};

use holescope_logs::{ArcRecord, Field, RecordFilter, RecordLog, filter};

use super::Action;

/// Rows moved by PageUp/PageDown
pub const PAGE_SIZE: usize = 20;

/// Cache of the displayed rows to avoid re-filtering on every render
#[derive(Default)]
pub struct ViewCache {
    /// Record log generation the rows were built from (None = invalid)
    cached_generation: Option<u64>,
    /// Filter the rows were built with
    cached_filter: Option<RecordFilter>,
    /// Displayed records, newest first
    pub rows: Vec<ArcRecord>,
}

impl ViewCache {
    /// Check if the rows are stale for the given filter and log generation
    pub fn needs_refresh(&self, filter: Option<&RecordFilter>, generation: u64) -> bool {
        self.cached_generation != Some(generation) || self.cached_filter.as_ref() != filter
    }

    pub fn update(&mut self, filter: Option<&RecordFilter>, generation: u64, rows: Vec<ArcRecord>) {
        self.cached_generation = Some(generation);
        self.cached_filter = filter.cloned();
        self.rows = rows;
    }

    pub fn invalidate(&mut self) {
        self.cached_generation = None;
    }

    /// How many of `rows` sit in front of the cached ones, when `rows` only
    /// grew at the top under the same filter. Zero otherwise.
    pub fn prepended_rows(&self, filter: Option<&RecordFilter>, rows: &[ArcRecord]) -> usize {
        if self.cached_generation.is_none() || self.cached_filter.as_ref() != filter {
            return 0;
        }
        let Some(added) = rows.len().checked_sub(self.rows.len()) else {
            return 0;
        };
        match (rows.get(added), self.rows.first()) {
            (Some(new), Some(old)) if Arc::ptr_eq(new, old) => added,
            _ => 0,
        }
    }
}

/// Which widget receives key input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Table,
    Detail,
    Search,
}

/// Field list for the record opened in the detail pane
pub struct DetailState {
    pub record: ArcRecord,
    pub list_state: ListState,
}

impl DetailState {
    pub fn new(record: ArcRecord) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { record, list_state }
    }

    /// Fields shown in the pane, `kind` first
    pub fn fields(&self) -> Vec<(Field, &str)> {
        self.record.populated_fields()
    }

    pub fn selected_field(&self) -> Option<(Field, String)> {
        let index = self.list_state.selected()?;
        self.fields()
            .get(index)
            .map(|(field, value)| (*field, value.to_string()))
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Widget with keyboard focus
    pub focus: Focus,

    /// Current search input text
    pub search_input: String,

    /// Currently active filter (None = show all)
    pub active_filter: Option<RecordFilter>,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Show per-kind statistics?
    pub stats_visible: bool,

    /// Selection in the record table
    pub table_state: TableState,

    /// Record opened in the detail pane
    pub detail: Option<DetailState>,

    /// Transient message for the status bar
    pub message: Option<String>,

    /// Rows currently displayed
    pub view: ViewCache,
}

impl Default for UiState {
    fn default() -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        Self {
            focus: Focus::Table,
            search_input: String::new(),
            active_filter: None,
            help_visible: false,
            stats_visible: false,
            table_state,
            detail: None,
            message: None,
            view: ViewCache::default(),
        }
    }
}

/// Global application state
pub struct AppState {
    /// Path or name of the log being viewed
    pub source_label: String,

    /// Following appended lines?
    pub follow: bool,

    /// Lines dropped as malformed since the last full load
    pub skipped_lines: usize,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(source_label: impl Into<String>, follow: bool) -> Self {
        Self {
            source_label: source_label.into(),
            follow,
            skipped_lines: 0,
            ui_state: UiState::default(),
            should_quit: false,
        }
    }

    /// Apply a UI action. `Reload` needs the log source and is left to the caller.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp => self.ui_state.help_visible = !self.ui_state.help_visible,
            Action::ToggleStats => self.ui_state.stats_visible = !self.ui_state.stats_visible,
            Action::OpenSearch => self.start_search(),
            Action::SearchInput(c) => self.search_input_char(c),
            Action::SearchBackspace => self.search_input_backspace(),
            Action::SearchClear => self.ui_state.search_input.clear(),
            Action::ApplySearch => self.apply_search(),
            Action::CancelSearch => self.cancel_search(),
            Action::ClearFilter => self.clear_filter(),
            Action::RowUp => self.row_up(),
            Action::RowDown => self.row_down(),
            Action::PageUp => self.page_up(),
            Action::PageDown => self.page_down(),
            Action::RowTop => self.row_top(),
            Action::RowBottom => self.row_bottom(),
            Action::OpenDetail => self.open_detail(),
            Action::DetailUp => self.detail_up(),
            Action::DetailDown => self.detail_down(),
            Action::ApplyDetailFilter => self.apply_detail_filter(),
            Action::CloseDetail => self.close_detail(),
            Action::DismissMessage => self.dismiss_message(),
            Action::Reload => {}
        }
    }

    /// Recompute the displayed rows if the log or the filter changed.
    /// Returns true when the rows were rebuilt.
    pub fn refresh_view(&mut self, log: &RecordLog) -> bool {
        let generation = log.generation();
        let active = self.ui_state.active_filter.as_ref();
        if !self.ui_state.view.needs_refresh(active, generation) {
            return false;
        }

        let snapshot = log.snapshot();
        let mut rows = match active {
            Some(f) => filter(&snapshot, f),
            None => snapshot.to_vec(),
        };
        rows.reverse();

        // Keep a selection below the top on the same record as rows arrive
        let added = self.ui_state.view.prepended_rows(active, &rows);
        if added > 0
            && let Some(selected) = self.ui_state.table_state.selected()
            && selected > 0
        {
            self.ui_state.table_state.select(Some(selected + added));
        }

        self.ui_state.view.update(active, generation, rows);
        self.clamp_selection();
        true
    }

    /// Displayed records, newest first
    pub fn rows(&self) -> &[ArcRecord] {
        &self.ui_state.view.rows
    }

    pub fn selected_record(&self) -> Option<&ArcRecord> {
        self.ui_state
            .table_state
            .selected()
            .and_then(|i| self.rows().get(i))
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        let selected = if len == 0 {
            None
        } else {
            Some(self.ui_state.table_state.selected().unwrap_or(0).min(len - 1))
        };
        self.ui_state.table_state.select(selected);
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let current = self.ui_state.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.ui_state.table_state.select(Some(next));
    }

    pub fn row_up(&mut self) {
        self.move_selection(-1);
    }

    pub fn row_down(&mut self) {
        self.move_selection(1);
    }

    pub fn page_up(&mut self) {
        self.move_selection(-(PAGE_SIZE as isize));
    }

    pub fn page_down(&mut self) {
        self.move_selection(PAGE_SIZE as isize);
    }

    pub fn row_top(&mut self) {
        if !self.rows().is_empty() {
            self.ui_state.table_state.select(Some(0));
        }
    }

    pub fn row_bottom(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.ui_state.table_state.select(Some(len - 1));
        }
    }

    /// Show the selected record's fields and move focus to them
    pub fn open_detail(&mut self) {
        if let Some(record) = self.selected_record().cloned() {
            self.ui_state.detail = Some(DetailState::new(record));
            self.ui_state.focus = Focus::Detail;
        }
    }

    pub fn detail_up(&mut self) {
        if let Some(detail) = &mut self.ui_state.detail {
            let i = detail.list_state.selected().unwrap_or(0);
            detail.list_state.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn detail_down(&mut self) {
        if let Some(detail) = &mut self.ui_state.detail {
            let last = detail.fields().len().saturating_sub(1);
            let i = detail.list_state.selected().unwrap_or(0);
            detail.list_state.select(Some((i + 1).min(last)));
        }
    }

    /// Filter on the field selected in the detail pane
    pub fn apply_detail_filter(&mut self) {
        let selected = self
            .ui_state
            .detail
            .as_ref()
            .and_then(|d| d.selected_field());

        if let Some((field, value)) = selected {
            self.set_filter(RecordFilter::field_equals(field, value));
            self.ui_state.focus = Focus::Table;
        }
    }

    /// Leave the detail pane, dropping the active filter
    pub fn close_detail(&mut self) {
        self.ui_state.detail = None;
        self.clear_filter();
    }

    pub fn set_filter(&mut self, filter: RecordFilter) {
        self.ui_state.active_filter = Some(filter);
        // Reset selection to the newest match
        self.ui_state.table_state.select(Some(0));
    }

    /// Clear the active filter and the search text
    pub fn clear_filter(&mut self) {
        self.ui_state.active_filter = None;
        self.ui_state.search_input.clear();
        self.ui_state.focus = Focus::Table;
        self.ui_state.table_state.select(Some(0));
    }

    /// Start search/filter input mode, editing the current text search if any
    pub fn start_search(&mut self) {
        self.ui_state.search_input = self.active_search_text();
        self.ui_state.focus = Focus::Search;
    }

    /// Leave search input without changing the active filter
    pub fn cancel_search(&mut self) {
        self.ui_state.search_input = self.active_search_text();
        self.ui_state.focus = Focus::Table;
    }

    /// Apply the current search input as a text filter
    pub fn apply_search(&mut self) {
        self.ui_state.focus = Focus::Table;

        if self.ui_state.search_input.is_empty() {
            self.ui_state.active_filter = None;
            self.ui_state.table_state.select(Some(0));
            return;
        }

        let needle = self.ui_state.search_input.clone();
        self.set_filter(RecordFilter::text_contains(needle));
    }

    fn active_search_text(&self) -> String {
        match &self.ui_state.active_filter {
            Some(RecordFilter::TextContains(needle)) => needle.clone(),
            _ => String::new(),
        }
    }

    /// Add a character to search input
    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
    }

    /// Remove last character from search input
    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
    }

    pub fn show_message(&mut self, msg: impl Into<String>) {
        self.ui_state.message = Some(msg.into());
    }

    pub fn dismiss_message(&mut self) {
        self.ui_state.message = None;
    }

    /// Record the outcome of a full (re)load
    pub fn loaded(&mut self, skipped: usize) {
        self.skipped_lines = skipped;
        self.ui_state.detail = None;
        if self.ui_state.focus == Focus::Detail {
            self.ui_state.focus = Focus::Table;
        }
        self.ui_state.view.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holescope_logs::{LineParser, RecordKind};

    fn log() -> RecordLog {
        let lines = [
            "Jan 2 03:04:05 dnsmasq[1]: query[A] example.com from 10.0.0.5",
            "Jan 2 03:04:05 dnsmasq[1]: forwarded example.com to 1.1.1.1",
            "Jan 2 03:04:05 dnsmasq[1]: reply example.com is 93.184.216.34",
            "Jan 2 03:04:06 dnsmasq[1]: query[A] ads.example.net from 10.0.0.7",
            "Jan 2 03:04:06 dnsmasq[1]: gravity blocked ads.example.net is 0.0.0.0",
        ];
        let log = RecordLog::new();
        log.replace(LineParser::new().parse_lines(lines, 1).records);
        log
    }

    fn state(log: &RecordLog) -> AppState {
        let mut state = AppState::new("test.log", false);
        state.refresh_view(log);
        state
    }

    #[test]
    fn test_rows_are_newest_first() {
        let log = log();
        let state = state(&log);
        let kinds: Vec<_> = state.rows().iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::Blocked,
                RecordKind::QueryA,
                RecordKind::Reply,
                RecordKind::Forwarded,
                RecordKind::QueryA,
            ]
        );
        assert_eq!(state.selected_record().map(|r| r.kind()), Some(RecordKind::Blocked));
    }

    #[test]
    fn test_refresh_only_when_stale() {
        let log = log();
        let mut state = state(&log);
        assert!(!state.refresh_view(&log));

        state.set_filter(RecordFilter::text_contains("ads"));
        assert!(state.refresh_view(&log));
        assert_eq!(state.rows().len(), 2);

        log.extend(
            LineParser::new()
                .parse_lines(["Jan 2 03:04:09 dnsmasq[1]: query[A] ads.example.net from 10.0.0.9"], 6)
                .records,
        );
        assert!(state.refresh_view(&log));
        assert_eq!(state.rows().len(), 3);
        assert_eq!(state.rows()[0].requester(), "10.0.0.9");
    }

    #[test]
    fn test_selection_bounds() {
        let log = log();
        let mut state = state(&log);

        state.row_up();
        assert_eq!(state.ui_state.table_state.selected(), Some(0));

        state.page_down();
        assert_eq!(state.ui_state.table_state.selected(), Some(4));

        state.row_top();
        state.row_down();
        assert_eq!(state.ui_state.table_state.selected(), Some(1));

        state.row_bottom();
        state.set_filter(RecordFilter::field_equals(Field::Kind, "blocked"));
        state.refresh_view(&log);
        assert_eq!(state.ui_state.table_state.selected(), Some(0));

        state.set_filter(RecordFilter::field_equals(Field::Kind, "read"));
        state.refresh_view(&log);
        assert!(state.rows().is_empty());
        assert_eq!(state.ui_state.table_state.selected(), None);
        assert!(state.selected_record().is_none());
    }

    #[test]
    fn test_detail_drill_down_uses_displayed_rows() {
        let log = log();
        let mut state = state(&log);

        // Narrow first, so row 0 of the view differs from row 0 of the log
        state.set_filter(RecordFilter::field_equals(Field::Requester, "10.0.0.5"));
        state.refresh_view(&log);
        state.open_detail();
        assert_eq!(state.ui_state.focus, Focus::Detail);

        let detail = state.ui_state.detail.as_ref().unwrap();
        assert_eq!(detail.record.domain(), "example.com");
        assert_eq!(
            detail.fields(),
            vec![
                (Field::Kind, "query-A"),
                (Field::Domain, "example.com"),
                (Field::Requester, "10.0.0.5"),
            ]
        );

        state.detail_down();
        state.apply_detail_filter();
        assert_eq!(state.ui_state.focus, Focus::Table);
        assert_eq!(
            state.ui_state.active_filter,
            Some(RecordFilter::field_equals(Field::Domain, "example.com"))
        );
        state.refresh_view(&log);
        assert_eq!(state.rows().len(), 3);

        state.close_detail();
        assert!(state.ui_state.detail.is_none());
        assert!(state.ui_state.active_filter.is_none());
        state.refresh_view(&log);
        assert_eq!(state.rows().len(), 5);
    }

    #[test]
    fn test_detail_selection_is_clamped() {
        let log = log();
        let mut state = state(&log);
        state.open_detail();
        for _ in 0..10 {
            state.detail_down();
        }
        let detail = state.ui_state.detail.as_ref().unwrap();
        // blocked: kind, result, domain
        assert_eq!(detail.list_state.selected(), Some(2));
        assert_eq!(detail.selected_field(), Some((Field::Domain, "ads.example.net".to_string())));
    }

    #[test]
    fn test_search_flow() {
        let log = log();
        let mut state = state(&log);

        state.start_search();
        assert_eq!(state.ui_state.focus, Focus::Search);
        for c in "1.1.1.1".chars() {
            state.search_input_char(c);
        }
        state.apply_search();
        assert_eq!(state.ui_state.focus, Focus::Table);
        state.refresh_view(&log);
        assert_eq!(state.rows().len(), 1);

        // Editing and cancelling keeps the applied filter
        state.start_search();
        assert_eq!(state.ui_state.search_input, "1.1.1.1");
        state.search_input_backspace();
        state.cancel_search();
        assert_eq!(state.ui_state.active_filter, Some(RecordFilter::text_contains("1.1.1.1")));
        assert_eq!(state.ui_state.search_input, "1.1.1.1");

        // Applying an empty search drops the filter
        state.start_search();
        state.ui_state.search_input.clear();
        state.apply_search();
        assert!(state.ui_state.active_filter.is_none());
    }

    #[test]
    fn test_clear_filter_resets_input() {
        let log = log();
        let mut state = state(&log);
        state.start_search();
        state.search_input_char('x');
        state.apply_search();
        state.clear_filter();
        assert!(state.ui_state.active_filter.is_none());
        assert!(state.ui_state.search_input.is_empty());
    }

    #[test]
    fn test_apply_actions() {
        let log = log();
        let mut state = state(&log);

        state.apply(Action::RowDown);
        state.apply(Action::RowDown);
        assert_eq!(state.ui_state.table_state.selected(), Some(2));

        state.apply(Action::OpenSearch);
        for c in "ads".chars() {
            state.apply(Action::SearchInput(c));
        }
        state.apply(Action::ApplySearch);
        state.refresh_view(&log);
        assert_eq!(state.rows().len(), 2);

        state.apply(Action::ToggleStats);
        state.apply(Action::ToggleHelp);
        assert!(state.ui_state.stats_visible);
        assert!(state.ui_state.help_visible);

        state.show_message("reloaded");
        assert_eq!(state.ui_state.message.as_deref(), Some("reloaded"));
        state.apply(Action::DismissMessage);
        assert!(state.ui_state.message.is_none());

        state.apply(Action::ClearFilter);
        state.apply(Action::Quit);
        assert!(state.ui_state.active_filter.is_none());
        assert!(state.should_quit);
    }

    #[test]
    fn test_loaded_invalidates_view() {
        let log = log();
        let mut state = state(&log);
        state.open_detail();
        state.loaded(3);
        assert_eq!(state.skipped_lines, 3);
        assert!(state.ui_state.detail.is_none());
        assert_eq!(state.ui_state.focus, Focus::Table);
        assert!(state.refresh_view(&log));
    }

    #[test]
    fn test_selection_stays_on_record_as_lines_arrive() {
        let log = log();
        let mut state = state(&log);
        let arrival = |n: usize| {
            LineParser::new()
                .parse_lines(
                    [format!("Jan 2 03:04:1{n} dnsmasq[1]: query[A] new{n}.test from 10.0.0.9")],
                    5 + n,
                )
                .records
        };

        state.ui_state.table_state.select(Some(2));
        let picked = state.selected_record().cloned().unwrap();

        log.extend(arrival(1));
        log.extend(arrival(2));
        assert!(state.refresh_view(&log));
        assert_eq!(state.ui_state.table_state.selected(), Some(4));
        assert!(Arc::ptr_eq(state.selected_record().unwrap(), &picked));

        // The top row keeps tracking the newest record
        state.ui_state.table_state.select(Some(0));
        log.extend(arrival(3));
        state.refresh_view(&log);
        assert_eq!(state.ui_state.table_state.selected(), Some(0));
        assert_eq!(state.selected_record().unwrap().domain(), "new3.test");

        // A filter change is a new view, not an arrival
        state.set_filter(RecordFilter::text_contains("new"));
        state.ui_state.table_state.select(Some(1));
        state.refresh_view(&log);
        assert_eq!(state.ui_state.table_state.selected(), Some(1));
    }
}
