use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

/// Status bar showing keyboard shortcuts on the left and counters on the right
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    right: Vec<Span<'a>>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Append a right-aligned segment
    pub fn right(mut self, span: Span<'a>) -> Self {
        if !self.right.is_empty() {
            self.right.push(Span::styled(" │ ", Theme::status_bar()));
        }
        self.right.push(span);
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
            spans.push(Span::styled(format!(" {}", desc), Theme::status_bar()));
        }

        // Counters win over hints when space runs out
        let right_width: u16 = self
            .right
            .iter()
            .map(|s| s.content.as_ref().width() as u16)
            .sum();
        let left_room = area.width.saturating_sub(right_width + 3);
        buf.set_line(area.x + 1, area.y, &Line::from(spans), left_room);

        if right_width > 0 {
            let right_x = area.x + area.width.saturating_sub(right_width + 1);
            buf.set_line(right_x, area.y, &Line::from(self.right), right_width);
        }
    }
}

/// Hints shown while the record table has focus
pub fn table_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Enter", "Details"),
        ("f", "Filter"),
        ("Esc", "Clear"),
        ("r", "Reload"),
        ("s", "Stats"),
        ("h", "Help"),
        ("q", "Quit"),
    ]
}

/// Hints shown while the detail pane has focus
pub fn detail_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("↑/k", "Up"),
        ("↓/j", "Down"),
        ("Enter", "Filter on field"),
        ("Esc", "Close"),
    ]
}

/// Hints shown while typing a search
pub fn search_hints() -> Vec<(&'static str, &'static str)> {
    vec![("Enter", "Apply"), ("Esc", "Cancel"), ("Ctrl+u", "Clear")]
}
