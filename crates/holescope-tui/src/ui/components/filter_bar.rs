use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{Focus, UiState};
use crate::ui::Theme;

/// Search field and active filter indicator
pub struct FilterBar;

impl FilterBar {
    pub fn render(frame: &mut Frame, area: Rect, ui: &UiState) {
        let editing = ui.focus == Focus::Search;
        let mut spans = Vec::new();

        if editing {
            spans.push(Span::styled(
                " /",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(ui.search_input.clone(), Theme::text_highlight()));
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        } else {
            spans.push(Span::styled(" Filter: ", Theme::text_dim()));
            match &ui.active_filter {
                Some(filter) => {
                    spans.push(Span::styled(filter.label(), Theme::text_highlight()));
                    spans.push(Span::styled("  [Esc] Clear  [f] Edit", Theme::text_dim()));
                }
                None => spans.push(Span::styled("None", Theme::text())),
            }
        }

        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if editing {
                    Theme::border_editing()
                } else {
                    Theme::border()
                })
                .title(Span::styled(" Search/Filter ", Theme::title())),
        );

        frame.render_widget(bar, area);
    }
}
