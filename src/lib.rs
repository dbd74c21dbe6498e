pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod report;
pub mod store;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use models::{Category, Priority, Task, TaskUpdate};
pub use store::{Statistics, TaskRef, TaskStore};
pub use utils::Profile;
