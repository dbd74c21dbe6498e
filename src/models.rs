use chrono::{NaiveDate, NaiveDateTime, Timelike};
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task description cannot be empty")]
    EmptyDescription,
    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Returned when a priority or category name is not one of the known values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: '{name}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub name: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum,
)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Upper-case name used in the tasks file and in listings
    pub fn name(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    /// One exclamation mark per severity level
    pub fn marks(self) -> &'static str {
        match self {
            Priority::Low => "!",
            Priority::Medium => "!!",
            Priority::High => "!!!",
        }
    }

    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let pos = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    // Exact match: only upper-case names are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "priority",
                name: s.to_string(),
            })
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum,
)]
pub enum Category {
    Work,
    Personal,
    Health,
    Education,
    Shopping,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Health,
        Category::Education,
        Category::Shopping,
        Category::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Work => "WORK",
            Category::Personal => "PERSONAL",
            Category::Health => "HEALTH",
            Category::Education => "EDUCATION",
            Category::Shopping => "SHOPPING",
            Category::Other => "OTHER",
        }
    }

    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "category",
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    description: String,
    pub priority: Priority,
    pub category: Category,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    notes: String,
    created_at: NaiveDateTime,
}

impl Task {
    /// Build a pending task stamped with the current local time
    pub fn new(
        description: &str,
        priority: Priority,
        category: Category,
        due_date: Option<NaiveDate>,
        notes: &str,
    ) -> Result<Self, ValidationError> {
        Self::with_created_at(
            description,
            priority,
            category,
            due_date,
            notes,
            chrono::Local::now().naive_local(),
        )
    }

    /// Same as [`Task::new`] with an explicit creation time
    /// Seconds are dropped so the timestamp survives a save/load cycle unchanged
    pub fn with_created_at(
        description: &str,
        priority: Priority,
        category: Category,
        due_date: Option<NaiveDate>,
        notes: &str,
        created_at: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        let description = validate_description(description)?;
        Ok(Self {
            description,
            priority,
            category,
            due_date,
            completed: false,
            notes: notes.trim().to_string(),
            created_at: truncate_to_minute(created_at),
        })
    }

    /// Always trimmed and non-empty; change it through [`TaskUpdate`]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Overdue means still pending with a due date strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }

    pub fn status_glyph(&self) -> &'static str {
        if self.completed { "✓" } else { "○" }
    }

    /// Case-insensitive match against description or notes
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.description.to_lowercase().contains(needle_lowercase)
            || self.notes.to_lowercase().contains(needle_lowercase)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} - {}",
            self.status_glyph(),
            self.priority.marks(),
            self.category,
            self.description
        )?;
        if let Some(due) = self.due_date {
            write!(f, " (Due: {})", due.format(crate::utils::DATE_FORMAT))?;
        }
        Ok(())
    }
}

/// Field changes applied by [`crate::store::TaskStore::update`]
/// `None` leaves a field untouched; `due_date: Some(None)` clears the deadline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub due_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self == &TaskUpdate::default()
    }

    /// Validate the patch, then write it into `task`
    /// Nothing is written when validation fails
    pub(crate) fn apply(self, task: &mut Task) -> Result<(), ValidationError> {
        let description = self
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?;

        if let Some(description) = description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(notes) = self.notes {
            task.notes = notes.trim().to_string();
        }
        Ok(())
    }
}

fn validate_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

fn truncate_to_minute(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}
