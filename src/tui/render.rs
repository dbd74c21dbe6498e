use ratatui::Frame;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::style::Style;
use crate::tui::{App, Layout, Mode, Tab};
use crate::tui::widgets::{
    tabs::render_tabs,
    task_list::render_task_list,
    item_view::render_item_view,
    stats_view::render_stats_view,
    status_bar::render_status_bar,
    help::render_help,
    form::render_task_form,
    color::parse_color,
    confirm_delete::render_confirm_delete,
};
use crate::utils::format_key_binding_for_display as display;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let title = if app.dirty { "Day Planner *" } else { "Day Planner" };
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(ratatui::layout::Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    let overdue_count = app.store.overdue(app.today).len();
    render_tabs(f, layout.tabs_area, app.ui.current_tab, overdue_count, &app.config);

    if app.ui.current_tab == Tab::Stats {
        // Stats has no list; it takes the whole content row
        let content = layout.list_area.union(layout.detail_area);
        render_stats_view(f, content, &app.statistics(), &app.config);
    } else {
        let rows = app.rows();
        app.sync_list_state();
        let list_title = match app.ui.current_tab {
            Tab::All if !app.search.query.trim().is_empty() => format!("Search: {}", app.search.query.trim()),
            tab => tab.title().to_string(),
        };
        render_task_list(
            f,
            layout.list_area,
            &list_title,
            &rows,
            &app.store,
            app.today,
            &mut app.ui.list_state,
            &app.config,
        );

        match app.ui.mode {
            Mode::Form => {
                if let Some(form) = app.form.task_form.as_mut() {
                    render_task_form(f, layout.detail_area, form, &app.config);
                }
            }
            Mode::Search => {
                let paragraph = Paragraph::new(format!("Search: {}", app.search.query))
                    .block(Block::default().borders(Borders::ALL).title("Search"))
                    .style(Style::default().fg(fg_color));
                f.render_widget(paragraph, layout.detail_area);
                // Cursor sits after the query text
                let x = layout.detail_area.x + 1 + "Search: ".len() as u16 + app.search.query.chars().count() as u16;
                if x < layout.detail_area.x + layout.detail_area.width.saturating_sub(1) {
                    f.set_cursor_position((x, layout.detail_area.y + 1));
                }
            }
            Mode::View | Mode::Help => {
                let selected = app
                    .selected_task_index()
                    .and_then(|i| app.store.get(i).ok().map(|t| (i, t)));
                render_item_view(f, layout.detail_area, selected, app.today, &app.config);
            }
        }
    }

    if app.ui.mode == Mode::Help {
        render_help(f, f.area(), &app.config);
    }

    if let Some(index) = app.modals.delete_confirmation {
        if let Ok(task) = app.store.get(index) {
            render_confirm_delete(f, f.area(), index + 1, task, app.modals.delete_modal_selection, &app.config);
        }
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    if app.modals.delete_confirmation.is_some() {
        return vec!["↑/↓: Choose".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()];
    }
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", display(&keys.help))],
        Mode::Search => vec![
            "Enter: Keep results".to_string(),
            "Esc: Clear search".to_string(),
        ],
        Mode::Form => vec![
            "Tab/Shift+Tab: Next/previous field".to_string(),
            "←/→: Change choice".to_string(),
            format!("Enter or {}: Save", display(&keys.save)),
            "Esc: Cancel".to_string(),
        ],
        Mode::View => vec![
            format!("{}: Quit", display(&keys.quit)),
            format!("{}: New", display(&keys.new)),
            format!("{}: Edit", display(&keys.edit)),
            format!("{}: Done", display(&keys.toggle_complete)),
            format!("{}: Delete", display(&keys.delete)),
            format!("{}: Search", display(&keys.search)),
            format!("{}: Save", display(&keys.save)),
            format!("{}: Help", display(&keys.help)),
        ],
    }
}
