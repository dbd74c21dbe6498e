use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::style::{Style, Modifier};
use ratatui::Frame;
use ratatui::layout::{Rect, Constraint, Layout, Direction};
use ratatui::text::Line;
use crate::Config;
use crate::tui::app::{TaskForm, TaskField};
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};

/// Text for a cycling field: the value flanked by arrows when focused
pub fn choice_text(value: &str, active: bool) -> String {
    if active {
        format!("◀ {} ▶", value)
    } else {
        value.to_string()
    }
}

fn editor_paragraph<'a>(editor: &Editor, width: u16, title: &'a str, style: Style) -> Paragraph<'a> {
    Paragraph::new(Line::from(editor.visible_text(width as usize)))
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title))
}

/// Task form in the detail pane; single-line fields are 3 rows (border, text, border)
pub fn render_task_form(f: &mut Frame, area: Rect, form: &mut TaskForm, config: &Config) {
    if area.width < 2 || area.height < 2 {
        return;
    }

    let active_theme = config.get_active_theme();
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };
    let highlight_style = Style::default().bg(highlight_bg).fg(highlight_fg);
    let inactive_field_style = Style::default()
        .fg(parse_color(&active_theme.fg))
        .add_modifier(Modifier::DIM);
    let style_for = |field: TaskField| {
        if form.current_field == field { highlight_style } else { inactive_field_style }
    };

    let field_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Description
            Constraint::Length(3), // Priority
            Constraint::Length(3), // Category
            Constraint::Length(3), // Due Date
            Constraint::Length(3), // Notes
            Constraint::Min(0),
        ])
        .split(area);

    let title = if form.editing_index.is_some() { "Description (editing)" } else { "Description (new task)" };
    let description_style = style_for(TaskField::Description);
    let priority_style = style_for(TaskField::Priority);
    let category_style = style_for(TaskField::Category);
    let due_style = style_for(TaskField::DueDate);
    let notes_style = style_for(TaskField::Notes);

    form.description.update_horizontal_scroll(field_areas[0].width as usize);
    form.due_date.update_horizontal_scroll(field_areas[3].width as usize);
    form.notes.update_horizontal_scroll(field_areas[4].width as usize);

    f.render_widget(
        editor_paragraph(&form.description, field_areas[0].width, title, description_style),
        field_areas[0],
    );

    let priority_text = choice_text(
        &format!("{} {}", form.priority, form.priority.marks()),
        form.current_field == TaskField::Priority,
    );
    f.render_widget(
        Paragraph::new(priority_text)
            .style(priority_style)
            .block(Block::default().borders(Borders::ALL).title("Priority")),
        field_areas[1],
    );

    let category_text = choice_text(form.category.name(), form.current_field == TaskField::Category);
    f.render_widget(
        Paragraph::new(category_text)
            .style(category_style)
            .block(Block::default().borders(Borders::ALL).title("Category")),
        field_areas[2],
    );

    f.render_widget(
        editor_paragraph(&form.due_date, field_areas[3].width, "Due Date (YYYY-MM-DD, empty for none)", due_style),
        field_areas[3],
    );

    f.render_widget(
        editor_paragraph(&form.notes, field_areas[4].width, "Notes", notes_style),
        field_areas[4],
    );

    let cursor = match form.current_field {
        TaskField::Description => form.description.get_cursor_screen_pos(field_areas[0]),
        TaskField::DueDate => form.due_date.get_cursor_screen_pos(field_areas[3]),
        TaskField::Notes => form.notes.get_cursor_screen_pos(field_areas[4]),
        TaskField::Priority | TaskField::Category => None,
    };
    if let Some((x, y)) = cursor {
        f.set_cursor_position((x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focused_choices_show_arrows() {
        assert_eq!(choice_text("WORK", true), "◀ WORK ▶");
        assert_eq!(choice_text("WORK", false), "WORK");
    }
}
