use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Areas of the log viewer screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewerAreas {
    pub header: Rect,
    pub stats: Option<Rect>,
    pub filter: Rect,
    pub table: Rect,
    pub detail: Option<Rect>,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Split the screen: header, optional stats, filter bar, content, status bar
    pub fn log_viewer(area: Rect, show_stats: bool, show_detail: bool) -> ViewerAreas {
        let mut constraints = vec![Constraint::Length(3)]; // Header
        if show_stats {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Length(3)); // Filter bar
        constraints.push(Constraint::Min(1)); // Records
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let (stats, rest) = if show_stats {
            (Some(chunks[1]), &chunks[2..])
        } else {
            (None, &chunks[1..])
        };
        let (table, detail) = Self::content(rest[1], show_detail);

        ViewerAreas {
            header: chunks[0],
            stats,
            filter: rest[0],
            table,
            detail,
            status: rest[2],
        }
    }

    /// Split the content area into the table and an optional detail pane
    pub fn content(area: Rect, show_detail: bool) -> (Rect, Option<Rect>) {
        if show_detail {
            let chunks = RatatuiLayout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Min(1),        // Records
                    Constraint::Percentage(35), // Detail pane
                ])
                .split(area);
            (chunks[0], Some(chunks[1]))
        } else {
            (area, None)
        }
    }

    /// Centered popup of at most `width` x `height` cells
    pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_viewer_areas() {
        let area = Rect::new(0, 0, 100, 40);

        let plain = Layout::log_viewer(area, false, false);
        assert_eq!(plain.header.height, 3);
        assert!(plain.stats.is_none());
        assert!(plain.detail.is_none());
        assert_eq!(plain.filter.y, 3);
        assert_eq!(plain.table.height, 40 - 3 - 3 - 1);
        assert_eq!(plain.status.y, 39);

        let full = Layout::log_viewer(area, true, true);
        assert_eq!(full.stats.map(|r| r.y), Some(3));
        assert_eq!(full.filter.y, 6);
        let detail = full.detail.unwrap();
        assert_eq!(full.table.width + detail.width, 100);
        assert_eq!(detail.y, full.table.y);
    }

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 30, 10);
        let popup = Layout::centered(area, 50, 24);
        assert_eq!(popup, Rect::new(2, 2, 26, 6));
    }
}
