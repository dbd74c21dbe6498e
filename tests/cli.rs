use chrono::NaiveDate;
use dayplan::cli::{self, CliError, Commands};
use dayplan::models::{Category, Priority};
use dayplan::persistence;
use dayplan::store::StoreError;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn add(description: &str, priority: Priority, category: Category, due: Option<&str>) -> Commands {
    Commands::Add {
        description: description.to_string(),
        priority,
        category,
        due: due.map(str::to_string),
        notes: String::new(),
    }
}

#[test]
fn mutating_commands_persist_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("tasks.json");

    cli::run(add("Buy milk", Priority::Low, Category::Shopping, None), &path, today()).unwrap();
    cli::run(
        add("Finish report", Priority::High, Category::Work, Some("2024-01-01")),
        &path,
        today(),
    )
    .unwrap();
    assert_eq!(persistence::load(&path).unwrap().len(), 2);

    let lines = cli::run(Commands::Overdue, &path, today()).unwrap();
    assert_eq!(
        lines,
        vec![
            "⚠️  Overdue Tasks (1 tasks)".to_string(),
            " 2. ○ [!!!] WORK - Finish report (Due: 2024-01-01)".to_string(),
        ]
    );

    cli::run(Commands::Done { position: 2 }, &path, today()).unwrap();
    let lines = cli::run(Commands::Stats, &path, today()).unwrap();
    assert!(lines.contains(&"Completion Rate: 50.0%".to_string()));
    assert!(lines.contains(&"Overdue: 0".to_string()));

    cli::run(Commands::Delete { position: 1 }, &path, today()).unwrap();
    let tasks = persistence::load(&path).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description(), "Finish report");
    assert!(tasks[0].completed);
}

#[test]
fn read_only_commands_do_not_create_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let lines = cli::run(Commands::List, &path, today()).unwrap();
    assert_eq!(lines, vec!["📭 No tasks available.".to_string()]);
    assert!(!path.exists());
}

#[test]
fn failed_commands_leave_the_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    cli::run(add("Only task", Priority::Medium, Category::Other, None), &path, today()).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let err = cli::run(Commands::Done { position: 5 }, &path, today()).unwrap_err();
    assert!(matches!(err, CliError::Store(StoreError::OutOfRange { index: 4, len: 1 })));
    assert_eq!(err.to_string(), "No task at position 5 (store holds 1)");

    let err = cli::run(add("  ", Priority::Low, Category::Other, None), &path, today()).unwrap_err();
    assert!(matches!(err, CliError::Store(StoreError::Validation(_))));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn search_finds_notes_too() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    cli::run(
        Commands::Add {
            description: "Call bank".to_string(),
            priority: Priority::Medium,
            category: Category::Personal,
            due: None,
            notes: "ask about MORTGAGE rate".to_string(),
        },
        &path,
        today(),
    )
    .unwrap();

    let lines = cli::run(Commands::Search { term: "mortgage".to_string() }, &path, today()).unwrap();
    assert_eq!(lines[0], "🔍 Search Results (1 found)");
    assert_eq!(lines[2], "    📝 ask about MORTGAGE rate");
}

#[test]
fn skipped_records_are_reported_before_a_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(
        &path,
        "[\n  {\"description\":\"Walk\",\"priority\":\"LOW\",\"category\":\"HEALTH\",\"dueDate\":\"\",\"createdAt\":\"2024-01-20 09:15\",\"completed\":false,\"notes\":\"\"},\n  {\"description\":\"Pay rent\",\"priority\":\"URGENT\",\"category\":\"PERSONAL\",\"dueDate\":\"\",\"createdAt\":\"2024-01-20 09:16\",\"completed\":false,\"notes\":\"\"}\n]",
    )
    .unwrap();

    let lines = cli::run(Commands::List, &path, today()).unwrap();
    assert_eq!(
        lines[0],
        format!("⚠️  Skipped 1 unreadable task record(s) in {}", path.display())
    );

    let lines = cli::run(add("Stretch", Priority::Medium, Category::Health, None), &path, today()).unwrap();
    assert!(lines[0].ends_with("; they are left out of the saved file"));
    assert_eq!(lines[1], "✅ Task added: 2. ○ [!!] HEALTH - Stretch");
    assert_eq!(persistence::load(&path).unwrap().len(), 2);
}
