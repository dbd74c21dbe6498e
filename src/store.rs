use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{Category, Priority, Task, TaskUpdate, ValidationError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No task at position {} (store holds {len})", .index + 1)]
    OutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A task borrowed from the store together with its current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRef<'a> {
    pub index: usize,
    pub task: &'a Task,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Percentage of completed tasks, one decimal place; 0.0 for an empty store
    pub completion_rate: f64,
    /// Only categories holding at least one task
    pub per_category: BTreeMap<Category, usize>,
}

/// In-memory, insertion-ordered task collection
///
/// Tasks have no stable identifier: a task is addressed by its 0-based
/// position. [`TaskStore::remove`] shifts every later task down by one, so
/// positions captured before a removal must be refreshed afterwards.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskRef<'_>> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, task)| TaskRef { index, task })
    }

    /// Append a new pending task stamped with the current time
    pub fn add(
        &mut self,
        description: &str,
        priority: Priority,
        category: Category,
        due_date: Option<NaiveDate>,
        notes: &str,
    ) -> Result<&Task, StoreError> {
        let task = Task::new(description, priority, category, due_date, notes)?;
        self.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Append an already-built task (used when restoring from disk)
    pub fn push(&mut self, task: Task) {
        tracing::debug!(position = self.tasks.len() + 1, "task added");
        self.tasks.push(task);
    }

    pub fn get(&self, index: usize) -> Result<&Task, StoreError> {
        self.tasks.get(index).ok_or(StoreError::OutOfRange {
            index,
            len: self.tasks.len(),
        })
    }

    /// Apply a field patch; `created_at` and `completed` are never touched
    pub fn update(&mut self, index: usize, update: TaskUpdate) -> Result<&Task, StoreError> {
        let len = self.tasks.len();
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(StoreError::OutOfRange { index, len })?;
        update.apply(task)?;
        tracing::debug!(position = index + 1, "task updated");
        Ok(task)
    }

    /// Flip the completed flag and return the new state
    pub fn toggle_complete(&mut self, index: usize) -> Result<bool, StoreError> {
        let len = self.tasks.len();
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(StoreError::OutOfRange { index, len })?;
        task.completed = !task.completed;
        tracing::debug!(position = index + 1, completed = task.completed, "task toggled");
        Ok(task.completed)
    }

    /// Remove and return the task at `index`
    ///
    /// Every task after `index` moves down one position.
    pub fn remove(&mut self, index: usize) -> Result<Task, StoreError> {
        if index >= self.tasks.len() {
            return Err(StoreError::OutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        tracing::debug!(position = index + 1, "task removed");
        Ok(self.tasks.remove(index))
    }

    /// Group tasks by category, keeping insertion order inside each group
    /// Categories without tasks are left out
    pub fn filter_by_category(&self) -> BTreeMap<Category, Vec<TaskRef<'_>>> {
        let mut groups: BTreeMap<Category, Vec<TaskRef<'_>>> = BTreeMap::new();
        for entry in self.iter() {
            groups.entry(entry.task.category).or_default().push(entry);
        }
        groups
    }

    /// Group tasks by priority; empty groups are left out
    pub fn filter_by_priority(&self, exclude_completed: bool) -> BTreeMap<Priority, Vec<TaskRef<'_>>> {
        let mut groups: BTreeMap<Priority, Vec<TaskRef<'_>>> = BTreeMap::new();
        for entry in self.iter() {
            if exclude_completed && entry.task.completed {
                continue;
            }
            groups.entry(entry.task.priority).or_default().push(entry);
        }
        groups
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<TaskRef<'_>> {
        self.iter().filter(|e| e.task.is_overdue(today)).collect()
    }

    /// Case-insensitive substring search over description and notes
    pub fn search(&self, term: &str) -> Vec<TaskRef<'_>> {
        let needle = term.trim().to_lowercase();
        self.iter().filter(|e| e.task.matches(&needle)).collect()
    }

    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        let overdue = self.tasks.iter().filter(|t| t.is_overdue(today)).count();

        let completion_rate = if total == 0 {
            0.0
        } else {
            let rate = completed as f64 / total as f64 * 100.0;
            (rate * 10.0).round() / 10.0
        };

        let mut per_category = BTreeMap::new();
        for task in &self.tasks {
            *per_category.entry(task.category).or_insert(0) += 1;
        }

        Statistics {
            total,
            completed,
            pending: total - completed,
            overdue,
            completion_rate,
            per_category,
        }
    }
}
