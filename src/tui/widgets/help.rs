use ratatui::widgets::{Block, Borders, Paragraph, Clear};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as display;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(config: &Config) -> String {
    let keys = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Switch tabs\n", display(&keys.tab_left), display(&keys.tab_right)));
    text.push_str("  1-5: Jump to tab (All, Categories, Priorities, Overdue, Stats)\n");
    text.push_str(&format!("  {} / {} or ↑ / ↓: Move in the list\n", display(&keys.list_up), display(&keys.list_down)));
    text.push('\n');

    text.push_str("Tasks:\n");
    text.push_str(&format!("  {}: New task\n", display(&keys.new)));
    text.push_str(&format!("  {}: Edit selected task\n", display(&keys.edit)));
    text.push_str(&format!("  {}: Delete selected task\n", display(&keys.delete)));
    text.push_str(&format!("  {}: Toggle completed\n", display(&keys.toggle_complete)));
    text.push_str(&format!("  {}: Search description and notes (All tab)\n", display(&keys.search)));
    text.push_str(&format!("  {}: Save now\n", display(&keys.save)));
    text.push('\n');

    text.push_str("Task form:\n");
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  ← / →: Cycle priority and category\n");
    text.push_str(&format!("  Enter or {}: Save task\n", display(&keys.save)));
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit (saves changes)\n", display(&keys.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", display(&keys.help)));

    text
}
