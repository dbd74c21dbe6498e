use crate::Config;
use crate::models::{Category, Priority, Task, TaskUpdate};
use crate::persistence::{self, PersistenceError};
use crate::store::{Statistics, StoreError, TaskRef, TaskStore};
use crate::tui::widgets::editor::Editor;
use crate::utils;
use chrono::NaiveDate;
use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    All,
    Categories,
    Priorities,
    Overdue,
    Stats,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::All, Tab::Categories, Tab::Priorities, Tab::Overdue, Tab::Stats];

    pub fn title(self) -> &'static str {
        match self {
            Tab::All => "All",
            Tab::Categories => "Categories",
            Tab::Priorities => "Priorities",
            Tab::Overdue => "Overdue",
            Tab::Stats => "Stats",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Tab for a 1-based number key
    pub fn from_number(n: u32) -> Option<Tab> {
        let index = (n as usize).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Search,
    Help,
    Form,
}

/// One line of the list panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Header(String),
    /// Store index of the task shown on this line
    Task(usize),
}

impl Row {
    pub fn is_header(&self) -> bool {
        matches!(self, Row::Header(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Description,
    Priority,
    Category,
    DueDate,
    Notes,
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub current_field: TaskField,
    pub description: Editor,
    pub priority: Priority,
    pub category: Category,
    pub due_date: Editor,
    pub notes: Editor,
    /// None for a new task, Some(index) when editing
    pub editing_index: Option<usize>,
}

impl TaskForm {
    pub fn new() -> Self {
        Self {
            current_field: TaskField::Description,
            description: Editor::new(),
            priority: Priority::Medium,
            category: Category::Other,
            due_date: Editor::new(),
            notes: Editor::new(),
            editing_index: None,
        }
    }

    pub fn from_task(index: usize, task: &Task) -> Self {
        let due = task.due_date.map(utils::format_date).unwrap_or_default();
        Self {
            current_field: TaskField::Description,
            description: Editor::from_string(task.description()),
            priority: task.priority,
            category: task.category,
            due_date: Editor::from_string(&due),
            notes: Editor::from_string(task.notes()),
            editing_index: Some(index),
        }
    }

    /// Editor behind the focused field; None for the cycling fields
    pub fn current_editor(&mut self) -> Option<&mut Editor> {
        match self.current_field {
            TaskField::Description => Some(&mut self.description),
            TaskField::DueDate => Some(&mut self.due_date),
            TaskField::Notes => Some(&mut self.notes),
            TaskField::Priority | TaskField::Category => None,
        }
    }

    /// Left/Right on priority or category
    pub fn cycle_current_field(&mut self, forward: bool) {
        match self.current_field {
            TaskField::Priority => {
                self.priority = if forward { self.priority.next() } else { self.priority.previous() };
            }
            TaskField::Category => {
                self.category = if forward { self.category.next() } else { self.category.previous() };
            }
            _ => {}
        }
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
    pub mode: Mode,
    /// Index into `App::rows()`, always on a task row when any exist
    pub selected_index: usize,
    pub list_state: ListState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            current_tab: Tab::All,
            mode: Mode::View,
            selected_index: 0,
            list_state: ListState::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    /// Store index of the task awaiting delete confirmation
    pub delete_confirmation: Option<usize>,
    /// 0 = Delete, 1 = Cancel
    pub delete_modal_selection: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub task_form: Option<TaskForm>,
}

pub struct App {
    pub config: Config,
    pub store: TaskStore,
    pub tasks_path: PathBuf,
    pub today: NaiveDate,
    /// Set when the store has changes not yet written to disk
    pub dirty: bool,

    pub ui: UiState,
    pub modals: ModalState,
    pub status: StatusState,
    pub search: SearchState,
    pub form: FormState,
}

impl App {
    pub fn new(config: Config, store: TaskStore, tasks_path: PathBuf) -> Self {
        let mut app = Self {
            config,
            store,
            tasks_path,
            today: utils::today(),
            dirty: false,
            ui: UiState::default(),
            modals: ModalState::default(),
            status: StatusState::default(),
            search: SearchState::default(),
            form: FormState::default(),
        };
        app.adjust_selected_index();
        app
    }

    pub fn refresh_today(&mut self) {
        self.today = utils::today();
    }

    /// Rows of the current tab, headers included
    pub fn rows(&self) -> Vec<Row> {
        match self.ui.current_tab {
            Tab::All => {
                let entries: Vec<TaskRef<'_>> = if self.search.query.trim().is_empty() {
                    self.store.iter().collect()
                } else {
                    self.store.search(&self.search.query)
                };
                entries.into_iter().map(|e| Row::Task(e.index)).collect()
            }
            Tab::Categories => {
                let mut rows = Vec::new();
                for (category, entries) in self.store.filter_by_category() {
                    rows.push(Row::Header(format!("{} ({})", category, entries.len())));
                    rows.extend(entries.into_iter().map(|e| Row::Task(e.index)));
                }
                rows
            }
            Tab::Priorities => {
                let groups = self.store.filter_by_priority(true);
                let mut rows = Vec::new();
                for priority in Priority::ALL.iter().rev() {
                    if let Some(entries) = groups.get(priority) {
                        rows.push(Row::Header(format!("{} ({})", priority, entries.len())));
                        rows.extend(entries.iter().map(|e| Row::Task(e.index)));
                    }
                }
                rows
            }
            Tab::Overdue => self
                .store
                .overdue(self.today)
                .into_iter()
                .map(|e| Row::Task(e.index))
                .collect(),
            Tab::Stats => Vec::new(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.store.statistics(self.today)
    }

    /// Store index of the highlighted task, if any
    pub fn selected_task_index(&self) -> Option<usize> {
        match self.rows().get(self.ui.selected_index) {
            Some(Row::Task(index)) => Some(*index),
            _ => None,
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_task_index().and_then(|i| self.store.get(i).ok())
    }

    pub fn sync_list_state(&mut self) {
        if self.rows().is_empty() {
            self.ui.list_state.select(None);
        } else {
            self.ui.list_state.select(Some(self.ui.selected_index));
        }
    }

    /// Clamp the selection after the rows changed and step off group headers
    pub fn adjust_selected_index(&mut self) {
        let rows = self.rows();
        if rows.is_empty() {
            self.ui.selected_index = 0;
            self.sync_list_state();
            return;
        }
        let mut index = self.ui.selected_index.min(rows.len() - 1);
        if rows[index].is_header() {
            index = (index..rows.len())
                .find(|&i| !rows[i].is_header())
                .or_else(|| (0..index).rev().find(|&i| !rows[i].is_header()))
                .unwrap_or(index);
        }
        self.ui.selected_index = index;
        self.sync_list_state();
    }

    pub fn move_selection_up(&mut self) {
        let rows = self.rows();
        if let Some(index) = (0..self.ui.selected_index.min(rows.len()))
            .rev()
            .find(|&i| !rows[i].is_header())
        {
            self.ui.selected_index = index;
        }
        self.sync_list_state();
    }

    pub fn move_selection_down(&mut self) {
        let rows = self.rows();
        if let Some(index) = (self.ui.selected_index + 1..rows.len()).find(|&i| !rows[i].is_header()) {
            self.ui.selected_index = index;
        }
        self.sync_list_state();
    }

    /// Highlight the row showing store index `task_index`, when it is visible
    pub fn select_task(&mut self, task_index: usize) {
        if let Some(position) = self.rows().iter().position(|r| *r == Row::Task(task_index)) {
            self.ui.selected_index = position;
        }
        self.adjust_selected_index();
    }

    pub fn switch_tab(&mut self, new_tab: Tab) {
        if self.ui.current_tab == new_tab {
            return;
        }
        let keep = self.selected_task_index();
        self.ui.current_tab = new_tab;
        self.ui.selected_index = 0;
        match keep {
            Some(index) => self.select_task(index),
            None => self.adjust_selected_index(),
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed() >= STATUS_MESSAGE_TIMEOUT {
                self.clear_status_message();
            }
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    /// Search always runs on the All tab
    pub fn enter_search_mode(&mut self) {
        self.switch_tab(Tab::All);
        self.ui.mode = Mode::Search;
    }

    /// Leave search; `keep_filter` leaves the results on screen
    pub fn exit_search_mode(&mut self, keep_filter: bool) {
        self.ui.mode = Mode::View;
        if !keep_filter {
            let keep = self.selected_task_index();
            self.search.query.clear();
            match keep {
                Some(index) => self.select_task(index),
                None => self.adjust_selected_index(),
            }
        }
    }

    pub fn add_to_search(&mut self, ch: char) {
        self.search.query.push(ch);
        self.ui.selected_index = 0;
        self.adjust_selected_index();
    }

    pub fn remove_from_search(&mut self) {
        self.search.query.pop();
        self.ui.selected_index = 0;
        self.adjust_selected_index();
    }

    pub fn enter_create_mode(&mut self) {
        self.form.task_form = Some(TaskForm::new());
        self.ui.mode = Mode::Form;
    }

    pub fn enter_edit_mode(&mut self) {
        let Some(index) = self.selected_task_index() else {
            self.set_status_message("No task selected".to_string());
            return;
        };
        match self.store.get(index) {
            Ok(task) => {
                self.form.task_form = Some(TaskForm::from_task(index, task));
                self.ui.mode = Mode::Form;
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    pub fn exit_form_mode(&mut self) {
        self.form.task_form = None;
        self.ui.mode = Mode::View;
    }

    pub fn navigate_form_field(&mut self, forward: bool) {
        if let Some(form) = self.form.task_form.as_mut() {
            form.current_field = match (form.current_field, forward) {
                (TaskField::Description, true) => TaskField::Priority,
                (TaskField::Priority, true) => TaskField::Category,
                (TaskField::Category, true) => TaskField::DueDate,
                (TaskField::DueDate, true) => TaskField::Notes,
                (TaskField::Notes, true) => TaskField::Description,
                (TaskField::Description, false) => TaskField::Notes,
                (TaskField::Priority, false) => TaskField::Description,
                (TaskField::Category, false) => TaskField::Priority,
                (TaskField::DueDate, false) => TaskField::Category,
                (TaskField::Notes, false) => TaskField::DueDate,
            };
        }
    }

    pub fn get_current_form_editor(&mut self) -> Option<&mut Editor> {
        self.form.task_form.as_mut().and_then(|f| f.current_editor())
    }

    /// Write the open form into the store
    ///
    /// On error the form stays open and the store is unchanged.
    pub fn save_form(&mut self) -> Result<usize, StoreError> {
        let Some(form) = self.form.task_form.as_ref() else {
            return Ok(self.ui.selected_index);
        };
        let due_date = utils::parse_optional_date(form.due_date.value())?;
        let index = match form.editing_index {
            None => {
                self.store.add(
                    form.description.value(),
                    form.priority,
                    form.category,
                    due_date,
                    form.notes.value(),
                )?;
                self.store.len() - 1
            }
            Some(index) => {
                // Text the user left alone is not written back, so stored
                // line breaks survive the single-line editor
                let stored = self.store.get(index)?;
                let edited = |editor: &Editor, current: &str| {
                    (editor.value() != Editor::from_string(current).value())
                        .then(|| editor.value().to_string())
                };
                let update = TaskUpdate {
                    description: edited(&form.description, stored.description()),
                    priority: Some(form.priority),
                    category: Some(form.category),
                    due_date: Some(due_date),
                    notes: edited(&form.notes, stored.notes()),
                };
                self.store.update(index, update)?;
                index
            }
        };
        self.dirty = true;
        self.exit_form_mode();
        self.select_task(index);
        Ok(index)
    }

    /// Save the form and report the outcome in the status bar
    pub fn submit_form(&mut self) {
        let editing = self
            .form
            .task_form
            .as_ref()
            .is_some_and(|f| f.editing_index.is_some());
        match self.save_form() {
            Ok(index) => {
                let verb = if editing { "updated" } else { "added" };
                self.set_status_message(format!("Task {} {}", index + 1, verb));
            }
            Err(StoreError::Validation(e)) => {
                self.set_status_message(format!("Validation error: {}", e));
            }
            Err(e) => self.set_status_message(format!("Failed to save task: {}", e)),
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(index) = self.selected_task_index() else {
            self.set_status_message("No task selected".to_string());
            return;
        };
        match self.store.toggle_complete(index) {
            Ok(completed) => {
                self.dirty = true;
                let state = if completed { "completed" } else { "incomplete" };
                self.set_status_message(format!("Task {} marked as {}", index + 1, state));
                // Completed tasks drop out of the Priorities and Overdue tabs
                self.adjust_selected_index();
            }
            Err(e) => self.set_status_message(format!("Failed to toggle task: {}", e)),
        }
    }

    /// Open the delete confirmation for the highlighted task
    pub fn request_delete(&mut self) {
        match self.selected_task_index() {
            Some(index) => {
                self.modals.delete_confirmation = Some(index);
                self.modals.delete_modal_selection = 0;
            }
            None => self.set_status_message("No task selected".to_string()),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.modals.delete_confirmation = None;
    }

    /// Act on the modal's current choice
    pub fn confirm_delete(&mut self) {
        let Some(index) = self.modals.delete_confirmation.take() else {
            return;
        };
        if self.modals.delete_modal_selection != 0 {
            return;
        }
        match self.store.remove(index) {
            Ok(task) => {
                self.dirty = true;
                self.set_status_message(format!("Task deleted: {}", task.description()));
                self.adjust_selected_index();
            }
            Err(e) => self.set_status_message(format!("Failed to delete task: {}", e)),
        }
    }

    /// Write the store to the tasks file
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        persistence::save(&self.tasks_path, self.store.tasks())?;
        self.dirty = false;
        Ok(())
    }

    /// Ctrl+s: save and report in the status bar
    pub fn save_with_status(&mut self) {
        match self.save() {
            Ok(()) => self.set_status_message(format!("Saved {} tasks", self.store.len())),
            Err(e) => {
                tracing::error!(error = %e, "save failed");
                self.set_status_message(format!("Failed to save: {}", e));
            }
        }
    }

    /// Save if anything changed since the last write
    pub fn save_if_dirty(&mut self) -> Result<(), PersistenceError> {
        if self.dirty { self.save() } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_tasks() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TaskStore::new();
        store.add("Buy milk", Priority::Low, Category::Shopping, None, "").unwrap();
        store
            .add(
                "Finish report",
                Priority::High,
                Category::Work,
                NaiveDate::from_ymd_opt(2024, 1, 1),
                "",
            )
            .unwrap();
        store.add("Stretch", Priority::Medium, Category::Health, None, "").unwrap();
        let path = dir.path().join("tasks.json");
        let mut app = App::new(Config::default(), store, path);
        app.today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        (dir, app)
    }

    #[test]
    fn tabs_cycle_and_map_numbers() {
        assert_eq!(Tab::All.previous(), Tab::Stats);
        assert_eq!(Tab::Stats.next(), Tab::All);
        assert_eq!(Tab::from_number(3), Some(Tab::Priorities));
        assert_eq!(Tab::from_number(0), None);
        assert_eq!(Tab::from_number(6), None);
    }

    #[test]
    fn category_rows_have_headers_that_are_skipped() {
        let (_dir, mut app) = app_with_tasks();
        app.switch_tab(Tab::Categories);
        let rows = app.rows();
        assert_eq!(rows[0], Row::Header("WORK (1)".to_string()));
        assert_eq!(rows.len(), 6);

        // The selected task follows into its group
        assert_eq!(app.ui.selected_index, 5);
        assert_eq!(app.selected_task_index(), Some(0));
        app.move_selection_up();
        assert_eq!(app.ui.selected_index, 3);
        assert_eq!(app.selected_task_index(), Some(2));
        app.move_selection_up();
        assert_eq!(app.ui.selected_index, 1);
        app.move_selection_up();
        assert_eq!(app.ui.selected_index, 1);
        app.move_selection_down();
        assert_eq!(app.ui.selected_index, 3);
    }

    #[test]
    fn switching_tabs_keeps_the_selected_task_when_visible() {
        let (_dir, mut app) = app_with_tasks();
        app.move_selection_down();
        assert_eq!(app.selected_task_index(), Some(1));
        app.switch_tab(Tab::Overdue);
        assert_eq!(app.selected_task_index(), Some(1));
        app.switch_tab(Tab::Stats);
        assert_eq!(app.selected_task_index(), None);
    }

    #[test]
    fn completed_tasks_leave_the_priorities_tab() {
        let (_dir, mut app) = app_with_tasks();
        app.switch_tab(Tab::Priorities);
        assert_eq!(app.rows()[0], Row::Header("HIGH (1)".to_string()));
        assert_eq!(app.selected_task_index(), Some(0));
        app.toggle_selected();
        assert!(app.dirty);
        assert!(!app.rows().contains(&Row::Task(0)));
        assert!(!app.rows()[app.ui.selected_index].is_header());
    }

    #[test]
    fn search_filters_the_all_tab() {
        let (_dir, mut app) = app_with_tasks();
        app.switch_tab(Tab::Overdue);
        app.enter_search_mode();
        assert_eq!(app.ui.current_tab, Tab::All);
        for ch in "MILK".chars() {
            app.add_to_search(ch);
        }
        assert_eq!(app.rows(), vec![Row::Task(0)]);
        app.exit_search_mode(false);
        assert_eq!(app.rows().len(), 3);
        assert_eq!(app.selected_task_index(), Some(0));
    }

    #[test]
    fn invalid_due_date_keeps_the_form_open() {
        let (_dir, mut app) = app_with_tasks();
        app.enter_create_mode();
        let form = app.form.task_form.as_mut().unwrap();
        for ch in "Call mom".chars() {
            form.description.insert_char(ch);
        }
        for ch in "next week".chars() {
            form.due_date.insert_char(ch);
        }
        app.submit_form();
        assert_eq!(app.ui.mode, Mode::Form);
        assert_eq!(app.store.len(), 3);
        assert!(app.status.message.as_deref().unwrap().starts_with("Validation error"));

        app.form.task_form.as_mut().unwrap().due_date.clear();
        app.submit_form();
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.store.len(), 4);
        assert_eq!(app.selected_task_index(), Some(3));
    }

    #[test]
    fn blank_description_is_rejected() {
        let (_dir, mut app) = app_with_tasks();
        app.enter_create_mode();
        app.form.task_form.as_mut().unwrap().description.insert_char(' ');
        assert!(matches!(app.save_form(), Err(StoreError::Validation(_))));
        assert!(app.form.task_form.is_some());
    }

    #[test]
    fn edit_form_updates_in_place() {
        let (_dir, mut app) = app_with_tasks();
        app.enter_edit_mode();
        {
            let form = app.form.task_form.as_mut().unwrap();
            assert_eq!(form.description.value(), "Buy milk");
            form.current_field = TaskField::Priority;
            form.cycle_current_field(true);
            app.navigate_form_field(true);
            app.form.task_form.as_mut().unwrap().cycle_current_field(false);
        }
        app.submit_form();
        let task = app.store.get(0).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Education);
        assert_eq!(app.store.len(), 3);
    }

    #[test]
    fn delete_needs_confirmation() {
        let (_dir, mut app) = app_with_tasks();
        app.request_delete();
        assert_eq!(app.modals.delete_confirmation, Some(0));

        app.modals.delete_modal_selection = 1;
        app.confirm_delete();
        assert_eq!(app.store.len(), 3);
        assert_eq!(app.modals.delete_confirmation, None);

        app.request_delete();
        app.confirm_delete();
        assert_eq!(app.store.len(), 2);
        assert_eq!(app.store.get(0).unwrap().description(), "Finish report");
    }

    #[test]
    fn save_writes_the_file_and_clears_dirty() {
        let (_dir, mut app) = app_with_tasks();
        app.toggle_selected();
        app.save_if_dirty().unwrap();
        assert!(!app.dirty);
        let loaded = persistence::load(&app.tasks_path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded[0].completed);
    }

    #[test]
    fn editing_other_fields_keeps_multiline_notes() {
        let (_dir, mut app) = app_with_tasks();
        app.store
            .add("Call bank", Priority::Low, Category::Other, None, "ask about\nthe fee")
            .unwrap();
        app.select_task(3);
        app.enter_edit_mode();
        app.form.task_form.as_mut().unwrap().priority = Priority::High;
        app.submit_form();

        let task = app.store.get(3).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.notes(), "ask about\nthe fee");

        app.enter_edit_mode();
        app.form.task_form.as_mut().unwrap().notes.insert_char('!');
        app.submit_form();
        assert_eq!(app.store.get(3).unwrap().notes(), "ask about the fee!");
    }
}
