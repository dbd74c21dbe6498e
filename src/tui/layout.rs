use ratatui::layout::{Rect, Layout as RatLayout, Direction, Constraint};

pub struct Layout {
    pub inner_area: Rect,  // Area inside the outer border
    pub tabs_area: Rect,
    pub list_area: Rect,
    pub detail_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application
    /// Width: list (30) + detail (20) inside the border
    /// Height: tabs, status and a few list rows inside the border
    pub const MIN_WIDTH: u16 = 50;
    pub const MIN_HEIGHT: u16 = 10;

    /// Share of the content width given to the task list
    const LIST_WIDTH_PERCENT: u16 = 55;

    pub fn calculate(size: Rect) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // List keeps at least 30 columns and leaves the detail pane 20
        let list_width = ((inner_area.width * Self::LIST_WIDTH_PERCENT) / 100)
            .max(30)
            .min(inner_area.width.saturating_sub(20));

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(1),    // Content (list + detail)
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(list_width),
                Constraint::Min(1),
            ])
            .split(vertical[1]);

        Self {
            inner_area,
            tabs_area: vertical[0],
            list_area: horizontal[0],
            detail_area: horizontal[1],
            status_area: vertical[2],
        }
    }
}
