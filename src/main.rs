use color_eyre::Result;
use clap::Parser;
use dayplan::{Config, Profile, TaskStore, cli::{self, Cli, Commands}, logging, persistence, utils};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(&utils::expand_path(&path.to_string_lossy()))?,
        None => Config::load_with_profile(profile)?,
    };
    if let Some(file) = cli.file.as_ref() {
        config.tasks_path = file.to_string_lossy().to_string();
    }

    // Logging is best effort; the planner works without it
    let _log_guard = match logging::init_logging(&config.get_log_dir(), &config.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    let tasks_path = config.get_tasks_path();
    let today = utils::today();

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let report = persistence::load_report(&tasks_path)?;
            let skipped = report.skipped;
            let mut app = dayplan::tui::App::new(config, TaskStore::from_tasks(report.tasks), tasks_path);
            if skipped > 0 {
                app.set_status_message(format!("Skipped {} unreadable task records", skipped));
            }
            dayplan::tui::run_event_loop(app)?;
        }
        command => {
            for line in cli::run(command, &tasks_path, today)? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
