use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use crate::store::Statistics;
use crate::Config;
use crate::tui::widgets::color::parse_color;

/// Statistics tab: counts, a completion gauge and the per-category breakdown
pub fn render_stats_view(f: &mut Frame, area: Rect, stats: &Statistics, config: &Config) {
    if area.width < 2 || area.height < 2 {
        return;
    }
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let base_style = Style::default().fg(fg_color);

    if stats.total == 0 {
        let paragraph = Paragraph::new("No tasks available for statistics.")
            .block(Block::default().borders(Borders::ALL).title("Statistics"))
            .style(base_style);
        f.render_widget(paragraph, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Counts
            Constraint::Length(3), // Gauge
            Constraint::Min(1),    // Categories
        ])
        .split(area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let overdue_style = Style::default().fg(parse_color(&active_theme.overdue_fg));
    let count_line = |label: &str, value: usize, style: Style| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), bold),
            Span::styled(value.to_string(), style),
        ])
    };
    let counts = vec![
        count_line("Total", stats.total, Style::default()),
        count_line("Completed", stats.completed, Style::default()),
        count_line("Pending", stats.pending, Style::default()),
        count_line("Overdue", stats.overdue, if stats.overdue > 0 { overdue_style } else { Style::default() }),
    ];
    f.render_widget(
        Paragraph::new(counts)
            .block(Block::default().borders(Borders::ALL).title("Statistics"))
            .style(base_style),
        chunks[0],
    );

    let ratio = (stats.completion_rate / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Completion Rate"))
        .gauge_style(Style::default().fg(parse_color(&active_theme.highlight_bg)))
        .ratio(ratio)
        .label(format!("{:.1}%", stats.completion_rate));
    f.render_widget(gauge, chunks[1]);

    let categories: Vec<Line> = stats
        .per_category
        .iter()
        .map(|(category, count)| Line::from(format!("{:<10} {}", category.name(), count)))
        .collect();
    f.render_widget(
        Paragraph::new(categories)
            .block(Block::default().borders(Borders::ALL).title("By Category"))
            .style(base_style),
        chunks[2],
    );
}
