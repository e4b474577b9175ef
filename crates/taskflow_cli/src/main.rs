//! CLI smoke and inspection entry point.
//!
//! # Responsibility
//! - Verify `taskflow_core` linkage with deterministic output.
//! - `taskflow_cli <db_path> [config_path]` loads the config, starts file
//!   logging and reports what the stored snapshot contains.
//!
//! Without `config_path` the CLI reads `taskflow.toml` next to the database;
//! logs go to `logs/` next to it unless the config names a `log_dir`.

use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use taskflow_core::{
    init_logging_from_config, logging_status, open_db, CoreConfig, LogNotificationSink,
    SqliteSnapshotStore, SystemClock, WorkspaceService,
};

const CONFIG_FILE_NAME: &str = "taskflow.toml";
const LOG_DIR_NAME: &str = "logs";

fn main() -> ExitCode {
    println!("taskflow_core ping={}", taskflow_core::ping());
    println!("taskflow_core version={}", taskflow_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let config_path = args.next().map(PathBuf::from);

    match inspect(Path::new(&db_path), config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("taskflow_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(db_path: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let db_path = absolute(db_path)?;
    let data_dir = db_path.parent().unwrap_or_else(|| Path::new("/"));

    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
    let config = CoreConfig::load(&config_path)
        .map_err(|err| format!("cannot load `{}`: {err}", config_path.display()))?;

    init_logging_from_config(&config, &data_dir.join(LOG_DIR_NAME))
        .map_err(|err| format!("cannot start logging: {err}"))?;
    if let Some((level, dir)) = logging_status() {
        println!("log_level={level} log_dir={}", dir.display());
    }

    let conn = open_db(&db_path)
        .map_err(|err| format!("cannot open `{}`: {err}", db_path.display()))?;
    let service = WorkspaceService::open(
        SqliteSnapshotStore::new(&conn),
        LogNotificationSink,
        SystemClock,
        &config,
    )
    .map_err(|err| format!("cannot load snapshot: {err}"))?;

    let state = service.state();
    info!(
        "event=cli_inspect module=cli status=ok tasks={} automations={}",
        state.tasks().len(),
        state.automations().len()
    );
    println!("tasks={}", state.tasks().len());
    println!("projects={}", state.projects().len());
    println!("goals={}", state.goals().len());
    println!("tags={}", state.tags().len());
    println!("documents={}", state.documents().len());
    println!(
        "automations={} active={}",
        state.automations().len(),
        state.automations().iter().filter(|rule| rule.active).count()
    );

    let overview = service.overview();
    println!(
        "completed={} overdue={} due_this_week={}",
        overview.completed, overview.overdue, overview.due_this_week
    );
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|err| format!("cannot resolve working directory: {err}"))?;
    Ok(cwd.join(path))
}
