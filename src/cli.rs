use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Category, Priority, TaskUpdate};
use crate::persistence::{self, PersistenceError};
use crate::report;
use crate::store::{StoreError, TaskStore};
use crate::utils::{parse_optional_date, position_to_index};

#[derive(Parser)]
#[command(name = "dayplan")]
#[command(about = "Daily planner - categorized, prioritized tasks in your terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tasks file to use instead of the configured one
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Use development mode (uses separate dev config/data)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a new task
    Add {
        /// Task description
        description: String,
        #[arg(short, long, value_enum, ignore_case = true, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(short, long, value_enum, ignore_case = true, default_value_t = Category::Other)]
        category: Category,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List all tasks with their positions
    List,
    /// Toggle a task between pending and completed
    Done {
        /// Task position as shown by `list`
        position: usize,
    },
    /// Change fields of an existing task
    Edit {
        /// Task position as shown by `list`
        position: usize,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long, value_enum, ignore_case = true)]
        priority: Option<Priority>,
        #[arg(short, long, value_enum, ignore_case = true)]
        category: Option<Category>,
        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a task; later positions move up by one
    Delete {
        /// Task position as shown by `list`
        position: usize,
    },
    /// Find tasks whose description or notes contain a term
    Search {
        term: String,
    },
    /// Show pending tasks past their due date
    Overdue,
    /// Show tasks grouped by category
    Categories,
    /// Show pending tasks grouped by priority
    Priorities,
    /// Show completion statistics
    Stats,
}

impl Commands {
    /// Whether running the command changes the store (and so must be saved)
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::Add { .. } | Commands::Done { .. } | Commands::Edit { .. } | Commands::Delete { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Positions start at 1")]
    InvalidPosition,
    #[error("Nothing to change: pass at least one field to edit")]
    NothingToEdit,
}

fn index_for(position: usize) -> Result<usize, CliError> {
    position_to_index(position).ok_or(CliError::InvalidPosition)
}

fn parse_due(due: Option<&str>) -> Result<Option<NaiveDate>, CliError> {
    match due {
        Some(raw) => parse_optional_date(raw).map_err(|e| CliError::DateParseError(e.to_string())),
        None => Ok(None),
    }
}

/// Run a one-shot command against the store and return the lines to print
pub fn execute(command: Commands, store: &mut TaskStore, today: NaiveDate) -> Result<Vec<String>, CliError> {
    match command {
        Commands::Tui => Ok(Vec::new()),
        Commands::Add { description, priority, category, due, notes } => {
            handle_add(store, &description, priority, category, due.as_deref(), &notes)
        }
        Commands::List => Ok(report::format_all(store)),
        Commands::Done { position } => handle_done(store, position),
        Commands::Edit { position, description, priority, category, due, clear_due, notes } => {
            let due_date = if clear_due {
                Some(None)
            } else {
                due.as_deref().map(|raw| parse_due(Some(raw))).transpose()?
            };
            let update = TaskUpdate {
                description,
                priority,
                category,
                due_date,
                notes,
            };
            handle_edit(store, position, update)
        }
        Commands::Delete { position } => handle_delete(store, position),
        Commands::Search { term } => Ok(report::format_search(&term, &store.search(&term))),
        Commands::Overdue => Ok(report::format_overdue(&store.overdue(today))),
        Commands::Categories => Ok(report::format_by_category(store)),
        Commands::Priorities => Ok(report::format_by_priority(store)),
        Commands::Stats => Ok(report::format_statistics(&store.statistics(today))),
    }
}

/// Load the tasks file, run the command, and save again if the command changed anything
///
/// Unreadable records are reported first; a mutating command drops them on save
pub fn run(command: Commands, tasks_path: &Path, today: NaiveDate) -> Result<Vec<String>, CliError> {
    let report = persistence::load_report(tasks_path)?;
    let mutating = command.is_mutating();

    let mut lines = Vec::new();
    if report.skipped > 0 {
        tracing::warn!(skipped = report.skipped, path = %tasks_path.display(), "running with unreadable records");
        let consequence = if mutating { "; they are left out of the saved file" } else { "" };
        lines.push(format!(
            "⚠️  Skipped {} unreadable task record(s) in {}{}",
            report.skipped,
            tasks_path.display(),
            consequence
        ));
    }

    let mut store = TaskStore::from_tasks(report.tasks);
    lines.extend(execute(command, &mut store, today)?);
    if mutating {
        persistence::save(tasks_path, store.tasks())?;
    }
    Ok(lines)
}

/// Handle the add command
pub fn handle_add(
    store: &mut TaskStore,
    description: &str,
    priority: Priority,
    category: Category,
    due: Option<&str>,
    notes: &str,
) -> Result<Vec<String>, CliError> {
    let due_date = parse_due(due)?;
    let task = store.add(description, priority, category, due_date, notes)?.to_string();
    Ok(vec![format!("✅ Task added: {}. {}", store.len(), task)])
}

/// Handle the done command (toggles completion)
pub fn handle_done(store: &mut TaskStore, position: usize) -> Result<Vec<String>, CliError> {
    let index = index_for(position)?;
    let completed = store.toggle_complete(index)?;
    let status = if completed { "completed" } else { "incomplete" };
    Ok(vec![format!("✅ Task {} marked as {}!", position, status)])
}

/// Handle the edit command
pub fn handle_edit(store: &mut TaskStore, position: usize, update: TaskUpdate) -> Result<Vec<String>, CliError> {
    if update.is_empty() {
        return Err(CliError::NothingToEdit);
    }
    let index = index_for(position)?;
    let task = store.update(index, update)?;
    Ok(vec![format!("✅ Task updated: {}. {}", position, task)])
}

/// Handle the delete command
pub fn handle_delete(store: &mut TaskStore, position: usize) -> Result<Vec<String>, CliError> {
    let index = index_for(position)?;
    let removed = store.remove(index)?;
    Ok(vec![format!("🗑️ Task deleted: {}", removed.description())])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn parses_add_with_case_insensitive_enums() {
        let cli = Cli::try_parse_from([
            "dayplan", "add", "Finish report", "--priority", "HIGH", "-c", "work", "--due", "2024-01-01",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Add {
                description: "Finish report".to_string(),
                priority: Priority::High,
                category: Category::Work,
                due: Some("2024-01-01".to_string()),
                notes: String::new(),
            })
        );
    }

    #[test]
    fn due_and_clear_due_conflict() {
        let parsed = Cli::try_parse_from(["dayplan", "edit", "1", "--due", "2024-01-01", "--clear-due"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["dayplan", "--dev"]).unwrap();
        assert!(cli.dev);
        assert!(cli.command.is_none());
    }

    #[test]
    fn add_then_toggle_by_position() {
        let mut store = TaskStore::new();
        let command = Commands::Add {
            description: "Buy milk".to_string(),
            priority: Priority::Low,
            category: Category::Shopping,
            due: None,
            notes: String::new(),
        };
        let lines = execute(command, &mut store, today()).unwrap();
        assert_eq!(lines, vec!["✅ Task added: 1. ○ [!] SHOPPING - Buy milk".to_string()]);

        let lines = execute(Commands::Done { position: 1 }, &mut store, today()).unwrap();
        assert_eq!(lines, vec!["✅ Task 1 marked as completed!".to_string()]);
        assert!(store.get(0).unwrap().completed);
    }

    #[test]
    fn bad_date_and_position_are_reported() {
        let mut store = TaskStore::new();
        let err = handle_add(&mut store, "x", Priority::Low, Category::Other, Some("tomorrow"), "").unwrap_err();
        assert!(matches!(err, CliError::DateParseError(_)));
        assert!(store.is_empty());

        assert!(matches!(handle_done(&mut store, 0), Err(CliError::InvalidPosition)));
        assert!(matches!(
            handle_delete(&mut store, 3),
            Err(CliError::Store(StoreError::OutOfRange { index: 2, len: 0 }))
        ));
    }

    #[test]
    fn edit_can_clear_due_date() {
        let mut store = TaskStore::new();
        store
            .add("x", Priority::Low, Category::Other, NaiveDate::from_ymd_opt(2024, 1, 1), "")
            .unwrap();
        let command = Commands::Edit {
            position: 1,
            description: None,
            priority: None,
            category: None,
            due: None,
            clear_due: true,
            notes: None,
        };
        execute(command, &mut store, today()).unwrap();
        assert_eq!(store.get(0).unwrap().due_date, None);

        assert!(matches!(
            handle_edit(&mut store, 1, TaskUpdate::default()),
            Err(CliError::NothingToEdit)
        ));
    }
}
