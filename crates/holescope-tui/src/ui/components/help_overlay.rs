use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::centered(frame.area(), 52, 29);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Records"),
            Self::key_line("j/↓", "Next row"),
            Self::key_line("k/↑", "Previous row"),
            Self::key_line("PgDn/^d", "Page down"),
            Self::key_line("PgUp/^u", "Page up"),
            Self::key_line("g", "Newest record"),
            Self::key_line("G", "Oldest record"),
            Self::key_line("Enter", "Show record details"),
            Line::from(""),
            Self::section("Details"),
            Self::key_line("Enter", "Filter on selected field"),
            Self::key_line("Esc", "Close and clear filter"),
            Line::from(""),
            Self::section("Filtering"),
            Self::key_line("f or /", "Search raw lines"),
            Self::key_line("Enter", "Apply search"),
            Self::key_line("Esc", "Cancel edit / clear filter"),
            Line::from(""),
            Self::section("Other"),
            Self::key_line("r", "Reload log file"),
            Self::key_line("s", "Toggle per-kind stats"),
            Self::key_line("h or ?", "Toggle this help"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(title: &str) -> Line<'_> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
