use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use holescope_logs::KindCounts;

use crate::ui::Theme;

/// Per-kind record counts
pub struct StatsBar;

impl StatsBar {
    pub fn render(frame: &mut Frame, area: Rect, counts: &KindCounts) {
        let mut spans = vec![Span::styled(" ", Theme::text())];

        for (kind, count) in counts.non_zero() {
            spans.push(Span::styled(format!("{}:", kind), Theme::kind(kind)));
            spans.push(Span::styled(format!("{} ", count), Theme::text()));
        }

        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled("Total:", Theme::text_dim()));
        spans.push(Span::styled(counts.total().to_string(), Theme::text()));

        let widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Stats ", Theme::title())),
        );

        frame.render_widget(widget, area);
    }
}
