use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use crate::tui::{App, Layout, Mode, Tab};
use crate::tui::error::TuiError;
use crate::utils::{parse_key_binding, ParsedKeyBinding};

/// Guard that ensures terminal state is restored even on panic
/// If the terminal is left in raw mode or the alternate screen, the user's shell is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut guard = Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: false,
        };
        execute!(io::stdout(), EnterAlternateScreen)?;
        guard.alternate_screen_enabled = true;
        Ok(guard)
    }

    /// Restore on normal exit; the guard does nothing on drop afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already in a cleanup path; errors are ignored
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Run the interactive UI until the user quits, then save pending changes
///
/// A failed save on the way out is logged and printed once the terminal is
/// back to normal; it does not turn into an error exit.
pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    validate_key_bindings(&app)?;

    // Check size before entering the alternate screen so the message stays visible
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    tracing::info!(tasks = app.store.len(), path = %app.tasks_path.display(), "tui started");

    let outcome = draw_and_handle_keys(&mut terminal, &mut app);
    if let Err(e) = &outcome {
        tracing::error!(error = %e, "event loop stopped on error");
    }
    let restored = guard.restore();

    // Pending changes are written however the loop ended
    if let Err(e) = app.save_if_dirty() {
        tracing::error!(error = %e, "failed to save tasks on exit");
        eprintln!("❌ Error saving tasks: {}", e);
    }
    tracing::info!("tui stopped");

    outcome.and(restored)
}

fn draw_and_handle_keys(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), TuiError> {
    loop {
        app.check_status_message_timeout();
        app.refresh_today();

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, app, &layout);
        })?;

        // Only Press events; Windows also reports Release
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(app, key_event)? {
                    return Ok(());
                }
            }
        }
    }
}

/// Reject unparsable key bindings before the terminal is taken over
pub fn validate_key_bindings(app: &App) -> Result<(), TuiError> {
    for (action, key) in app.config.key_bindings.entries() {
        parse_key_binding(key)
            .map_err(|e| TuiError::KeyBindingError(format!("{} = \"{}\": {}", action, key, e)))?;
    }
    Ok(())
}

fn binding(key_str: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(key_str).map_err(TuiError::KeyBindingError)
}

/// Dispatch one key press; returns true when the app should quit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    // Delete confirmation captures every key while shown
    if app.modals.delete_confirmation.is_some() {
        return handle_delete_confirmation_modal(app, key_event);
    }

    match app.ui.mode {
        Mode::Form => handle_form_mode(app, key_event),
        Mode::Search => handle_search_mode(app, key_event),
        Mode::Help => handle_help_mode(app, key_event),
        Mode::View => handle_view_mode(app, key_event),
    }
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        // Two options, so up and down both flip the choice
        KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
            app.modals.delete_modal_selection = 1 - app.modals.delete_modal_selection.min(1);
        }
        KeyCode::Enter => app.confirm_delete(),
        KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Esc || binding(&app.config.key_bindings.help)?.matches(&key_event) {
        app.exit_help_mode();
    }
    Ok(false)
}

fn handle_search_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.exit_search_mode(false),
        KeyCode::Enter => app.exit_search_mode(true),
        KeyCode::Backspace => app.remove_from_search(),
        KeyCode::Up => app.move_selection_up(),
        KeyCode::Down => app.move_selection_down(),
        KeyCode::Char(c) if !crate::utils::has_primary_modifier(key_event.modifiers) => app.add_to_search(c),
        _ => {}
    }
    Ok(false)
}

fn handle_form_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if binding(&app.config.key_bindings.save)?.matches(&key_event) {
        app.submit_form();
        return Ok(false);
    }

    match key_event.code {
        KeyCode::Esc => {
            app.exit_form_mode();
            app.set_status_message("Edit cancelled".to_string());
        }
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab => app.navigate_form_field(true),
        KeyCode::BackTab => app.navigate_form_field(false),
        KeyCode::Up => app.navigate_form_field(false),
        KeyCode::Down => app.navigate_form_field(true),
        _ => {
            let word_jump = crate::utils::has_primary_modifier(key_event.modifiers);
            if let Some(form) = app.form.task_form.as_mut() {
                if let Some(editor) = form.current_editor() {
                    match key_event.code {
                        KeyCode::Char(c) if !word_jump => editor.insert_char(c),
                        KeyCode::Backspace => editor.delete_char(),
                        KeyCode::Delete => editor.delete_forward(),
                        KeyCode::Left if word_jump => editor.move_cursor_word_left(),
                        KeyCode::Right if word_jump => editor.move_cursor_word_right(),
                        KeyCode::Left => editor.move_cursor_left(),
                        KeyCode::Right => editor.move_cursor_right(),
                        KeyCode::Home => editor.move_cursor_home(),
                        KeyCode::End => editor.move_cursor_end(),
                        _ => {}
                    }
                } else {
                    match key_event.code {
                        KeyCode::Left | KeyCode::Char('h') => form.cycle_current_field(false),
                        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => form.cycle_current_field(true),
                        _ => {}
                    }
                }
            }
        }
    }
    Ok(false)
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let keys = app.config.key_bindings.clone();

    if binding(&keys.quit)?.matches(&key_event) {
        return Ok(true);
    }

    if key_event.code == KeyCode::Esc {
        // Esc in view mode drops a kept search filter
        if !app.search.query.is_empty() {
            app.exit_search_mode(false);
        }
        return Ok(false);
    }

    // Number keys jump straight to a tab
    if let KeyCode::Char(c) = key_event.code {
        if key_event.modifiers == KeyModifiers::NONE || key_event.modifiers == KeyModifiers::SHIFT {
            if let Some(tab) = c.to_digit(10).and_then(Tab::from_number) {
                app.switch_tab(tab);
                return Ok(false);
            }
        }
    }

    if binding(&keys.tab_left)?.matches(&key_event) {
        app.switch_tab(app.ui.current_tab.previous());
        return Ok(false);
    }
    if binding(&keys.tab_right)?.matches(&key_event) {
        app.switch_tab(app.ui.current_tab.next());
        return Ok(false);
    }

    if key_event.code == KeyCode::Down || binding(&keys.list_down)?.matches(&key_event) {
        app.move_selection_down();
        return Ok(false);
    }
    if key_event.code == KeyCode::Up || binding(&keys.list_up)?.matches(&key_event) {
        app.move_selection_up();
        return Ok(false);
    }

    if binding(&keys.save)?.matches(&key_event) {
        app.save_with_status();
        return Ok(false);
    }
    if binding(&keys.new)?.matches(&key_event) {
        app.enter_create_mode();
        return Ok(false);
    }
    if binding(&keys.edit)?.matches(&key_event) {
        app.enter_edit_mode();
        return Ok(false);
    }
    if binding(&keys.delete)?.matches(&key_event) {
        app.request_delete();
        return Ok(false);
    }
    if binding(&keys.toggle_complete)?.matches(&key_event) {
        app.toggle_selected();
        return Ok(false);
    }
    if binding(&keys.search)?.matches(&key_event) {
        app.enter_search_mode();
        return Ok(false);
    }
    if binding(&keys.help)?.matches(&key_event) {
        app.enter_help_mode();
        return Ok(false);
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::models::{Category, Priority};
    use crate::store::TaskStore;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TaskStore::new();
        store.add("Buy milk", Priority::Low, Category::Shopping, None, "").unwrap();
        store.add("Finish report", Priority::High, Category::Work, None, "").unwrap();
        let path = dir.path().join("tasks.json");
        (dir, App::new(Config::default(), store, path))
    }

    #[test]
    fn quit_key_ends_the_loop() {
        let (_dir, mut app) = app();
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert!(!handle_key_event(&mut app, key(KeyCode::Char('j'))).unwrap());
    }

    #[test]
    fn number_keys_switch_tabs() {
        let (_dir, mut app) = app();
        handle_key_event(&mut app, key(KeyCode::Char('5'))).unwrap();
        assert_eq!(app.ui.current_tab, Tab::Stats);
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        assert_eq!(app.ui.current_tab, Tab::All);
    }

    #[test]
    fn typing_in_the_form_then_enter_adds_a_task() {
        let (_dir, mut app) = app();
        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.ui.mode, Mode::Form);
        // 'q' is text here, not quit
        for c in "Pay quarterly tax".chars() {
            assert!(!handle_key_event(&mut app, key(KeyCode::Char(c))).unwrap());
        }
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();

        assert_eq!(app.ui.mode, Mode::View);
        let task = app.store.get(2).unwrap();
        assert_eq!(task.description(), "Pay quarterly tax");
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn delete_flow_through_keys() {
        let (_dir, mut app) = app();
        handle_key_event(&mut app, key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.modals.delete_confirmation, Some(0));
        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.store.len(), 2);

        handle_key_event(&mut app, key(KeyCode::Char('d'))).unwrap();
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.store.len(), 1);
        assert!(app.dirty);
    }

    #[test]
    fn ctrl_s_saves() {
        let (_dir, mut app) = app();
        handle_key_event(&mut app, key(KeyCode::Char(' '))).unwrap();
        assert!(app.dirty);
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();
        assert!(!app.dirty);
        assert!(app.tasks_path.exists());
    }

    #[test]
    fn search_mode_collects_text() {
        let (_dir, mut app) = app();
        handle_key_event(&mut app, key(KeyCode::Char('/'))).unwrap();
        for c in "report".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.selected_task_index(), Some(1));
        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(app.search.query.is_empty());
    }

    #[test]
    fn unknown_binding_is_reported_before_startup() {
        let (_dir, mut app) = app();
        assert!(validate_key_bindings(&app).is_ok());

        app.config.key_bindings.toggle_complete = "Spacebar".to_string();
        match validate_key_bindings(&app) {
            Err(TuiError::KeyBindingError(message)) => assert!(message.starts_with("toggle_complete = \"Spacebar\"")),
            other => panic!("expected a key binding error, got {:?}", other),
        }
    }

    #[test]
    fn key_error_leaves_unsaved_tasks_for_the_exit_save() {
        let (_dir, mut app) = app();
        app.config.key_bindings.toggle_complete = "Spacebar".to_string();

        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        for c in "Renew passport".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.dirty);

        let err = handle_key_event(&mut app, key(KeyCode::Char('/'))).unwrap_err();
        assert!(matches!(err, TuiError::KeyBindingError(_)));

        app.save_if_dirty().unwrap();
        let saved = crate::persistence::load(&app.tasks_path).unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[2].description(), "Renew passport");
    }
}
