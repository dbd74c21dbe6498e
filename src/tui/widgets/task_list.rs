use ratatui::widgets::{Block, Borders, List, ListItem, StatefulWidget, Scrollbar, ScrollbarState, ScrollbarOrientation};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Rect, Layout, Direction, Constraint};
use ratatui::widgets::ListState;
use chrono::NaiveDate;
use crate::models::Task;
use crate::store::TaskStore;
use crate::Config;
use crate::tui::app::Row;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};

/// Cut `text` to `max_width` characters, marking the cut with "..."
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() > max_width {
        text.chars().take(max_width.saturating_sub(3)).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// List line for a task: its 1-based position and the usual one-line summary
pub fn task_label(index: usize, task: &Task) -> String {
    format!("{:2}. {}", index + 1, task)
}

pub fn render_task_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[Row],
    store: &TaskStore,
    today: NaiveDate,
    list_state: &mut ListState,
    config: &Config,
) {
    let max_width = area.width.saturating_sub(4) as usize; // 2 for borders, 2 for padding

    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };
    let header_style = Style::default()
        .fg(parse_color(&active_theme.tab_bg))
        .add_modifier(Modifier::BOLD);
    let overdue_style = Style::default().fg(parse_color(&active_theme.overdue_fg));
    let completed_style = Style::default().fg(fg_color).add_modifier(Modifier::DIM);

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| match row {
            Row::Header(text) => ListItem::new(truncate(text, max_width)).style(header_style),
            Row::Task(index) => match store.get(*index) {
                Ok(task) => {
                    let item = ListItem::new(truncate(&task_label(*index, task), max_width));
                    if task.is_overdue(today) {
                        item.style(overdue_style)
                    } else if task.completed {
                        item.style(completed_style)
                    } else {
                        item
                    }
                }
                Err(_) => ListItem::new(""),
            },
        })
        .collect();

    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // Scrollbar
        ])
        .split(area);

    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    let task_count = rows.iter().filter(|r| !r.is_header()).count();
    let block_title = format!("{} ({} of {})", title, task_count, store.len());
    let total_items = items.len();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(block_title))
        .style(Style::default().fg(fg_color))
        .highlight_style(
            Style::default()
                .fg(highlight_fg)
                .bg(highlight_bg)
        );

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if total_items > visible_items && visible_items > 0 && scrollbar_area.width > 0 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1, // Start after top border
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );

        let selected_index = list_state.selected().unwrap_or(0);
        let scroll_position = selected_index.saturating_sub(visible_items - 1);

        let mut scrollbar_state = ScrollbarState::new(total_items)
            .viewport_content_length(visible_items)
            .position(scroll_position);

        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");

        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Priority};

    #[test]
    fn labels_use_one_based_positions() {
        let task = Task::new("Buy milk", Priority::Low, Category::Shopping, None, "").unwrap();
        assert_eq!(task_label(0, &task), " 1. ○ [!] SHOPPING - Buy milk");
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("○ a longer line", 8), "○ a l...");
    }
}
