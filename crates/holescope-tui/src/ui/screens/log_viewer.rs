use std::borrow::Cow;

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use holescope_logs::{Record, RecordFilter, RecordLog};

use crate::app::{AppState, Focus};
use crate::ui::components::{
    DetailPane, FilterBar, HelpOverlay, StatsBar, StatusBar, detail_hints, search_hints,
    table_hints,
};
use crate::ui::{Layout, Theme};

const TIME_FORMAT: &str = "%b %e %H:%M:%S";
const TIME_WIDTH: u16 = 15;
const KIND_WIDTH: u16 = 10;
const HIGHLIGHT_SYMBOL: &str = "› ";

/// Main screen: record table, filter bar, detail pane and status bar
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, log: &RecordLog) {
        state.refresh_view(log);

        let areas = Layout::log_viewer(
            frame.area(),
            state.ui_state.stats_visible,
            state.ui_state.detail.is_some(),
        );

        Self::render_header(frame, areas.header, state, log);

        if let Some(area) = areas.stats {
            StatsBar::render(frame, area, &log.kind_counts());
        }

        FilterBar::render(frame, areas.filter, &state.ui_state);

        Self::render_table(frame, areas.table, state);

        if let (Some(area), Some(detail)) = (areas.detail, state.ui_state.detail.as_mut()) {
            let focused = state.ui_state.focus == Focus::Detail;
            DetailPane::render(frame, area, detail, focused);
        }

        Self::render_status_bar(frame, areas.status, state, log);

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, log: &RecordLog) {
        let mut spans = vec![
            Span::styled("holescope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.source_label.as_str(), Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("{} records", log.len()), Theme::text()),
        ];
        if state.follow {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("following", Style::default().fg(Theme::SUCCESS)));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_table(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let total = state.rows().len();
        let focused = state.ui_state.focus == Focus::Table;

        // Only the visible window is turned into rows
        let inner_height = area.height.saturating_sub(3) as usize; // borders + header row
        let selected = state.ui_state.table_state.selected();
        let offset = scroll_offset(
            state.ui_state.table_state.offset(),
            selected,
            inner_height,
            total,
        );
        *state.ui_state.table_state.offset_mut() = offset;

        let message_width = area
            .width
            .saturating_sub(2 + HIGHLIGHT_SYMBOL.width() as u16 + TIME_WIDTH + KIND_WIDTH + 2)
            as usize;

        let filter = state.ui_state.active_filter.as_ref();

        let rows: Vec<Row> = state
            .rows()
            .iter()
            .skip(offset)
            .take(inner_height)
            .map(|record| Self::record_row(record, filter, message_width))
            .collect();

        let title = if state.ui_state.active_filter.is_some() {
            format!(" Records ({} matching) ", total)
        } else {
            format!(" Records ({}) ", total)
        };

        let table = Table::new(
            rows,
            [
                Constraint::Length(TIME_WIDTH),
                Constraint::Length(KIND_WIDTH),
                Constraint::Min(1),
            ],
        )
        .header(Row::new(["Time", "Kind", "Line"]).style(Theme::header_row()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if focused {
                    Theme::border_focused()
                } else {
                    Theme::border()
                })
                .title(Span::styled(title, Theme::title())),
        )
        .row_highlight_style(if focused {
            Theme::row_selected()
        } else {
            Theme::row_selected_unfocused()
        })
        .highlight_symbol(HIGHLIGHT_SYMBOL);

        // Rows are pre-windowed, so the widget sees a zero offset
        let mut window_state = TableState::default().with_selected(selected.map(|s| s - offset));
        frame.render_stateful_widget(table, area, &mut window_state);
    }

    fn record_row<'a>(
        record: &Record,
        filter: Option<&RecordFilter>,
        message_width: usize,
    ) -> Row<'a> {
        let kind = record.kind();
        let text = record.display_text();
        let text = truncate_to_width(&text, message_width);
        let ranges = filter.map(|f| f.find_matches(&text)).unwrap_or_default();

        Row::new(vec![
            Cell::from(Span::styled(
                record.timestamp().format(TIME_FORMAT).to_string(),
                Theme::text_dim(),
            )),
            Cell::from(Span::styled(kind.as_str(), Theme::kind(kind))),
            Cell::from(Line::from(highlight_matches(&text, &ranges, Theme::text()))),
        ])
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, log: &RecordLog) {
        let hints = match state.ui_state.focus {
            Focus::Table => table_hints(),
            Focus::Detail => detail_hints(),
            Focus::Search => search_hints(),
        };

        let mut bar = StatusBar::new().hints(hints);

        if let Some(message) = &state.ui_state.message {
            bar = bar.right(Span::styled(message.as_str(), Theme::status_bar_warning()));
        }
        bar = bar.right(Span::styled(
            format!("{} records", log.len()),
            Theme::status_bar(),
        ));
        if state.skipped_lines > 0 {
            bar = bar.right(Span::styled(
                format!("{} skipped", state.skipped_lines),
                Theme::status_bar_warning(),
            ));
        }
        if state.follow {
            bar = bar.right(Span::styled("▼ follow", Theme::status_bar_following()));
        }

        frame.render_widget(bar, area);
    }
}

/// Keep the selected row inside a window of `height` rows
fn scroll_offset(offset: usize, selected: Option<usize>, height: usize, total: usize) -> usize {
    let max_offset = total.saturating_sub(height);
    let Some(selected) = selected else {
        return offset.min(max_offset);
    };
    if height == 0 {
        return selected;
    }

    let offset = if selected < offset {
        selected
    } else if selected >= offset + height {
        selected + 1 - height
    } else {
        offset
    };
    offset.min(max_offset)
}

/// Cut `text` to `max_width` display columns, marking the cut with an ellipsis
fn truncate_to_width(text: &str, max_width: usize) -> Cow<'_, str> {
    if text.width() <= max_width {
        return Cow::Borrowed(text);
    }

    let budget = max_width.saturating_sub(1);
    let mut width = 0;
    let mut end = 0;
    for (i, c) in text.char_indices() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        end = i + c.len_utf8();
    }

    Cow::Owned(format!("{}…", &text[..end]))
}

/// Split `text` into spans with the given byte ranges highlighted
fn highlight_matches(text: &str, ranges: &[(usize, usize)], base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last_end = 0;
    for &(start, end) in ranges {
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), Theme::text_match()));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base));
    }
    spans
}
