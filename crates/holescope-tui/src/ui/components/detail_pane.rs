use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use holescope_logs::Field;

use crate::app::DetailState;
use crate::ui::Theme;

/// Fields of the opened record; Enter filters on the selected one
pub struct DetailPane;

impl DetailPane {
    pub fn render(frame: &mut Frame, area: Rect, detail: &mut DetailState, focused: bool) {
        let items: Vec<ListItem> = detail
            .fields()
            .into_iter()
            .map(|(field, value)| {
                let value_style = match field {
                    Field::Kind => Theme::kind(detail.record.kind()),
                    _ => Theme::text(),
                };
                ListItem::new(vec![
                    Line::from(Span::styled(field.label(), Theme::text_dim())),
                    Line::from(Span::styled(format!("  {}", value), value_style)),
                ])
            })
            .collect();

        let title = format!(
            " {} ",
            detail.record.timestamp().format("%b %e %H:%M:%S")
        );

        let list = List::new(items)
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
            .highlight_style(if focused {
                Theme::row_selected()
            } else {
                Theme::row_selected_unfocused()
            })
            .highlight_symbol("› ");

        frame.render_stateful_widget(list, area, &mut detail.list_state);
    }
}
