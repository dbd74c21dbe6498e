//! Reading and writing the tasks file.
//!
//! The file is a JSON array holding one flat record per line:
//!
//! ```text
//! [
//!   {"description":"Buy milk","priority":"LOW","category":"SHOPPING","dueDate":"","createdAt":"2024-03-05 14:07","completed":false,"notes":""},
//!   {"description":"Finish report","priority":"HIGH","category":"WORK","dueDate":"2024-01-01","createdAt":"2024-03-05 14:09","completed":true,"notes":"urgent"}
//! ]
//! ```
//!
//! Loading is tolerant: a record that cannot be decoded is skipped and the
//! rest of the file still loads. When the document as a whole is not valid
//! JSON (a truncated write, a hand edit gone wrong) every line that still
//! holds a complete record is recovered.
//!
//! Files from the older planner escaped quotes but wrote backslashes raw, so
//! `C:\Users` lands in the file as-is and breaks strict JSON. Once a record
//! only parses with backslashes taken literally, the whole file is read that
//! way.

use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

use crate::models::{Category, Priority, Task, UnknownVariant, ValidationError};
use crate::utils::{format_date, format_datetime, parse_date, parse_datetime};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to read tasks file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to write tasks file {path}: {message}")]
    Write { path: String, message: String },
    #[error("Failed to create data directory: {0}")]
    DirectoryError(String),
    #[error("Failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a single record was dropped while loading
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),
    #[error("invalid due date '{0}'")]
    InvalidDueDate(String),
    #[error("invalid creation timestamp '{0}'")]
    InvalidCreatedAt(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Outcome of decoding a tasks file
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tasks: Vec<Task>,
    pub skipped: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOut<'a> {
    description: &'a str,
    priority: &'static str,
    category: &'static str,
    due_date: String,
    created_at: String,
    completed: bool,
    notes: &'a str,
}

impl<'a> From<&'a Task> for RecordOut<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            description: task.description(),
            priority: task.priority.name(),
            category: task.category.name(),
            due_date: task.due_date.map(format_date).unwrap_or_default(),
            created_at: format_datetime(task.created_at()),
            completed: task.completed,
            notes: task.notes(),
        }
    }
}

/// Encode tasks as a JSON array with one record per line
pub fn serialize(tasks: &[Task]) -> Result<String, PersistenceError> {
    let mut out = String::from("[\n");
    for (i, task) in tasks.iter().enumerate() {
        out.push_str("  ");
        out.push_str(&serde_json::to_string(&RecordOut::from(task))?);
        if i + 1 < tasks.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push(']');
    Ok(out)
}

/// Decode every readable task, silently dropping bad records
pub fn deserialize(text: &str) -> Vec<Task> {
    decode(text).tasks
}

/// Decode every readable task and count the records that were dropped
pub fn decode(text: &str) -> LoadReport {
    let text = text.trim();
    if text.is_empty() {
        return LoadReport::default();
    }

    let results: Vec<Result<Task, RecordParseError>> =
        match serde_json::from_str::<Vec<Value>>(text) {
            Ok(values) => values.iter().map(decode_record).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "tasks file is not a valid document, recovering line by line");
                scan_lines(text)
            }
        };

    let mut report = LoadReport::default();
    for (n, result) in results.into_iter().enumerate() {
        match result {
            Ok(task) => report.tasks.push(task),
            Err(e) => {
                tracing::warn!(record = n + 1, error = %e, "skipping unreadable task record");
                report.skipped += 1;
            }
        }
    }
    report
}

/// Recover records from a damaged document, one candidate per line
fn scan_lines(text: &str) -> Vec<Result<Task, RecordParseError>> {
    let candidates: Vec<&str> = text
        .lines()
        .map(|line| line.trim().trim_end_matches(','))
        .map(|line| line.trim_start_matches('[').trim_end_matches(']').trim())
        .filter(|line| !line.is_empty())
        .collect();

    let raw_backslashes = candidates.iter().any(|line| {
        serde_json::from_str::<Value>(line).is_err()
            && serde_json::from_str::<Value>(&escape_raw_backslashes(line)).is_ok()
    });
    if raw_backslashes {
        tracing::warn!("tasks file has unescaped backslashes, reading them literally");
    }

    candidates
        .into_iter()
        .map(|line| {
            let parsed = if raw_backslashes {
                serde_json::from_str::<Value>(&escape_raw_backslashes(line))
            } else {
                serde_json::from_str::<Value>(line)
            };
            parsed
                .map_err(|e| RecordParseError::Malformed(e.to_string()))
                .and_then(|value| decode_record(&value))
        })
        .collect()
}

/// Turn every `\` that does not start `\"` into an escaped backslash
fn escape_raw_backslashes(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
        } else if chars.peek() == Some(&'"') {
            out.push(c);
            out.push('"');
            chars.next();
        } else {
            out.push_str("\\\\");
        }
    }
    out
}

fn decode_record(value: &Value) -> Result<Task, RecordParseError> {
    let record = value.as_object().ok_or(RecordParseError::NotAnObject)?;
    let field = |key: &str| record.get(key).and_then(Value::as_str).unwrap_or("");

    let priority: Priority = field("priority").parse()?;
    let category: Category = field("category").parse()?;

    let due_date = match field("dueDate") {
        "" => None,
        raw => Some(parse_date(raw).map_err(|_| RecordParseError::InvalidDueDate(raw.to_string()))?),
    };

    let raw_created = field("createdAt");
    let created_at = parse_datetime(raw_created)
        .map_err(|_| RecordParseError::InvalidCreatedAt(raw_created.to_string()))?;

    let completed = match record.get("completed") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };

    let mut task = Task::with_created_at(
        field("description"),
        priority,
        category,
        due_date,
        field("notes"),
        created_at,
    )?;
    task.completed = completed;
    Ok(task)
}

/// Read the tasks file; a missing file is an empty list
pub fn load(path: &Path) -> Result<Vec<Task>, PersistenceError> {
    load_report(path).map(|report| report.tasks)
}

/// Like [`load`], also reporting how many records were skipped
pub fn load_report(path: &Path) -> Result<LoadReport, PersistenceError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no tasks file yet, starting empty");
            return Ok(LoadReport::default());
        }
        Err(e) => {
            return Err(PersistenceError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    if matches!(text, Cow::Owned(_)) {
        tracing::warn!(path = %path.display(), "tasks file is not valid UTF-8, bad bytes replaced");
    }

    let report = decode(&text);
    tracing::info!(
        path = %path.display(),
        loaded = report.tasks.len(),
        skipped = report.skipped,
        "tasks loaded"
    );
    Ok(report)
}

/// Write every task to `path`, replacing the previous contents
pub fn save(path: &Path, tasks: &[Task]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::DirectoryError(e.to_string()))?;
        }
    }

    let text = serialize(tasks)?;
    fs::write(path, text).map_err(|e| PersistenceError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!(path = %path.display(), count = tasks.len(), "tasks saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn created() -> chrono::NaiveDateTime {
        parse_datetime("2024-03-05 14:07").unwrap()
    }

    fn task(description: &str, notes: &str) -> Task {
        Task::with_created_at(
            description,
            Priority::Medium,
            Category::Personal,
            None,
            notes,
            created(),
        )
        .unwrap()
    }

    #[test]
    fn serialize_writes_one_record_per_line() {
        let text = serialize(&[task("a", ""), task("b", "")]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[");
        assert!(lines[1].starts_with("  {\"description\":\"a\""));
        assert!(lines[1].ends_with("},"));
        assert!(!lines[2].ends_with(','));
        assert_eq!(lines[3], "]");
        assert!(lines[1].contains("\"dueDate\":\"\""));
        assert!(lines[1].contains("\"createdAt\":\"2024-03-05 14:07\""));
        assert!(lines[1].contains("\"completed\":false"));
    }

    #[test]
    fn empty_store_round_trips() {
        let text = serialize(&[]).unwrap();
        assert_eq!(text, "[\n]");
        assert!(deserialize(&text).is_empty());
        assert!(deserialize("   ").is_empty());
    }

    #[test]
    fn delimiters_in_text_survive() {
        let tricky = task(r#"say "hi" },{ to \ everyone"#, "line one\nline two");
        let text = serialize(std::slice::from_ref(&tricky)).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(deserialize(&text), vec![tricky]);
    }

    #[test]
    fn completed_accepts_bool_or_string() {
        let text = r#"[
  {"description":"a","priority":"LOW","category":"WORK","dueDate":"","createdAt":"2024-03-05 14:07","completed":"TRUE","notes":""},
  {"description":"b","priority":"LOW","category":"WORK","dueDate":"","createdAt":"2024-03-05 14:07","completed":"maybe","notes":""},
  {"description":"c","priority":"LOW","category":"WORK","dueDate":"","createdAt":"2024-03-05 14:07","notes":""}
]"#;
        let tasks = deserialize(text);
        let flags: Vec<bool> = tasks.iter().map(|t| t.completed).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn bad_records_are_skipped_individually() {
        let text = r#"[
  {"description":"ok","priority":"HIGH","category":"HEALTH","dueDate":"2024-01-31","createdAt":"2024-03-05 14:07","completed":false,"notes":""},
  {"description":"bad priority","priority":"URGENT","category":"HEALTH","dueDate":"","createdAt":"2024-03-05 14:07","completed":false,"notes":""},
  {"description":"bad date","priority":"LOW","category":"HEALTH","dueDate":"2024-13-01","createdAt":"2024-03-05 14:07","completed":false,"notes":""},
  {"description":"no timestamp","priority":"LOW","category":"HEALTH","dueDate":"","completed":false,"notes":""},
  {"description":"","priority":"LOW","category":"HEALTH","dueDate":"","createdAt":"2024-03-05 14:07","completed":false,"notes":""},
  42
]"#;
        let report = decode(text);
        assert_eq!(report.skipped, 5);
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].description(), "ok");
        assert_eq!(report.tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn decode_record_reports_reason() {
        let value: Value = serde_json::from_str(
            r#"{"description":"x","priority":"LOW","category":"CHORES","createdAt":"2024-03-05 14:07"}"#,
        )
        .unwrap();
        assert_eq!(
            decode_record(&value).unwrap_err(),
            RecordParseError::UnknownVariant(UnknownVariant {
                kind: "category",
                name: "CHORES".to_string(),
            })
        );
    }

    #[test]
    fn truncated_file_recovers_complete_lines() {
        let full = serialize(&[task("first", ""), task("second", ""), task("third", "")]).unwrap();
        // Cut the document in the middle of the third record
        let cut = full.find("third").unwrap();
        let report = decode(&full[..cut]);
        let names: Vec<&str> = report.tasks.iter().map(|t| t.description()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn single_line_array_still_parses() {
        let text = r#"[{"description":"a","priority":"LOW","category":"OTHER","dueDate":"","createdAt":"2024-03-05 14:07","completed":true,"notes":"n"},{"description":"b","priority":"MEDIUM","category":"OTHER","dueDate":"","createdAt":"2024-03-05 14:08","completed":false,"notes":""}]"#;
        let tasks = deserialize(text);
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].completed);
    }
}
