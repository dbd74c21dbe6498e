use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use chrono::NaiveDate;
use crate::models::Task;
use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::utils::{format_date, format_datetime};

/// Label/value pairs shown in the detail pane, one per task field
pub fn detail_fields(index: usize, task: &Task, today: NaiveDate) -> Vec<(&'static str, String)> {
    let status = if task.completed {
        "Completed".to_string()
    } else if task.is_overdue(today) {
        "Pending (overdue)".to_string()
    } else {
        "Pending".to_string()
    };
    vec![
        ("Position", (index + 1).to_string()),
        ("Description", task.description().to_string()),
        ("Status", status),
        ("Priority", format!("{} {}", task.priority, task.priority.marks())),
        ("Category", task.category.to_string()),
        ("Due Date", task.due_date.map(format_date).unwrap_or_else(|| "-".to_string())),
        ("Created", format_datetime(task.created_at())),
        ("Notes", if task.notes().is_empty() { "-".to_string() } else { task.notes().to_string() }),
    ]
}

pub fn render_item_view(f: &mut Frame, area: Rect, selected: Option<(usize, &Task)>, today: NaiveDate, config: &Config) {
    if area.width < 2 || area.height < 2 {
        return;
    }

    let active_theme = config.get_active_theme();
    let base_style = Style::default().fg(parse_color(&active_theme.fg));
    let block = Block::default().borders(Borders::ALL).title("Task");

    let Some((index, task)) = selected else {
        let paragraph = Paragraph::new("No task selected. Press n to add one.")
            .block(block)
            .style(base_style);
        f.render_widget(paragraph, area);
        return;
    };

    let label_style = Style::default().add_modifier(Modifier::BOLD);
    let overdue_style = Style::default().fg(parse_color(&active_theme.overdue_fg));
    let overdue = task.is_overdue(today);

    let lines: Vec<Line> = detail_fields(index, task, today)
        .into_iter()
        .map(|(label, value)| {
            let value_style = if overdue && (label == "Status" || label == "Due Date") {
                overdue_style
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{}: ", label), label_style),
                Span::styled(value, value_style),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(base_style)
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(paragraph, area);
}
