//! Plain-text rendering of store queries for the one-shot commands.

use crate::store::{Statistics, TaskRef, TaskStore};

/// Numbered task line followed by an indented notes line when notes exist
/// Numbers are the 1-based store positions, so they can be fed back to `done`/`edit`/`delete`
pub fn format_task_lines(entries: &[TaskRef<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in entries {
        lines.push(format!("{:2}. {}", entry.index + 1, entry.task));
        if !entry.task.notes().is_empty() {
            lines.push(format!("    📝 {}", entry.task.notes()));
        }
    }
    lines
}

pub fn format_all(store: &TaskStore) -> Vec<String> {
    if store.is_empty() {
        return vec!["📭 No tasks available.".to_string()];
    }
    let entries: Vec<TaskRef<'_>> = store.iter().collect();
    let mut lines = vec![format!("📋 All Tasks ({} total)", store.len())];
    lines.extend(format_task_lines(&entries));
    lines
}

/// Sections with a heading and count for every group, in iteration order
fn format_groups<'a, 't: 'a, K: 'a>(
    groups: impl Iterator<Item = (&'a K, &'a Vec<TaskRef<'t>>)>,
    heading: impl Fn(&K, usize) -> String,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, entries) in groups {
        lines.push(heading(key, entries.len()));
        lines.extend(format_task_lines(entries).into_iter().map(|l| format!("  {}", l)));
    }
    lines
}

pub fn format_by_category(store: &TaskStore) -> Vec<String> {
    if store.is_empty() {
        return vec!["📭 No tasks available.".to_string()];
    }
    let mut lines = vec!["📂 Tasks by Category".to_string()];
    lines.extend(format_groups(store.filter_by_category().iter(), |category, count| {
        format!("{} ({} tasks):", category, count)
    }));
    lines
}

/// Pending tasks grouped by priority, most severe first
pub fn format_by_priority(store: &TaskStore) -> Vec<String> {
    let groups = store.filter_by_priority(true);
    if groups.is_empty() {
        return vec!["🎉 No pending tasks.".to_string()];
    }
    let mut lines = vec!["🔥 Tasks by Priority".to_string()];
    lines.extend(format_groups(groups.iter().rev(), |priority, count| {
        format!("{} Priority ({} tasks):", priority, count)
    }));
    lines
}

pub fn format_overdue(entries: &[TaskRef<'_>]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["🎉 No overdue tasks!".to_string()];
    }
    let mut lines = vec![format!("⚠️  Overdue Tasks ({} tasks)", entries.len())];
    lines.extend(format_task_lines(entries));
    lines
}

pub fn format_search(term: &str, entries: &[TaskRef<'_>]) -> Vec<String> {
    if entries.is_empty() {
        return vec![format!("🔍 No tasks found matching '{}'", term.trim())];
    }
    let mut lines = vec![format!("🔍 Search Results ({} found)", entries.len())];
    lines.extend(format_task_lines(entries));
    lines
}

pub fn format_statistics(stats: &Statistics) -> Vec<String> {
    if stats.total == 0 {
        return vec!["📭 No tasks available for statistics.".to_string()];
    }
    let mut lines = vec![
        "📊 Task Statistics".to_string(),
        format!("Total Tasks: {}", stats.total),
        format!("Completed: {}", stats.completed),
        format!("Pending: {}", stats.pending),
        format!("Overdue: {}", stats.overdue),
        format!("Completion Rate: {:.1}%", stats.completion_rate),
        String::new(),
        "Tasks by Category:".to_string(),
    ];
    for (category, count) in &stats.per_category {
        lines.push(format!("  {}: {}", category, count));
    }
    lines
}
