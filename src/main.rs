mod app;
mod config;
mod input;
mod list;
mod ui;

use std::env;
use std::path::Path;

use color_eyre::eyre::{bail, WrapErr};

use clap::{Parser, Subcommand};

use list::storage::{
    find_store_dir, load_checklist, load_local_config, record_activity, save_checklist, FileStore,
};
use list::Filter;

#[derive(Parser)]
#[command(name = "checklist", about = "A keyboard-first checklist TUI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new task
    Add {
        /// Task text
        text: String,
    },
    /// List tasks
    List {
        /// Filter (all, active, completed)
        #[arg(short, long, default_value = "all")]
        filter: Filter,
    },
    /// Toggle a task's done state
    Toggle {
        /// Task id
        id: u64,
    },
    /// Replace a task's text
    Edit {
        /// Task id
        id: u64,
        /// New text
        text: String,
    },
    /// Delete a task
    Delete {
        /// Task id
        id: u64,
    },
    /// Stream activity log to stdout (JSONL, one entry per line)
    Log,
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let cwd = match env::current_dir() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: cannot determine current directory: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Command::Add { text }) => cmd_add(&cwd, &text),
        Some(Command::List { filter }) => cmd_list(&cwd, filter),
        Some(Command::Toggle { id }) => cmd_toggle(&cwd, id),
        Some(Command::Edit { id, text }) => cmd_edit(&cwd, id, &text),
        Some(Command::Delete { id }) => cmd_delete(&cwd, id),
        Some(Command::Log) => cmd_log(&cwd),
        None => cmd_tui(&cwd),
    };

    if let Err(e) = result {
        print_user_error(&e);
        std::process::exit(1);
    }
}

/// Print a user-friendly error message, with actionable hints for known error types.
fn print_user_error(error: &color_eyre::Report) {
    // Walk the error chain looking for known types.
    if let Some(storage_err) = error.downcast_ref::<list::storage::StorageError>() {
        match storage_err {
            list::storage::StorageError::Io(e) => {
                eprintln!("error: could not read or write checklist files.");
                eprintln!("  {e}");
            }
            list::storage::StorageError::Json(e) => {
                eprintln!("error: failed to encode the checklist.");
                eprintln!("  {e}");
            }
            list::storage::StorageError::TomlDe(e) => {
                eprintln!("error: config file has invalid TOML syntax.");
                eprintln!("  {e}");
            }
        }
        return;
    }

    // For eyre::eyre!() / bail!() messages, print the full error chain.
    // These are already human-readable strings like "Task 3 not found".
    eprintln!("error: {e:#}", e = error);
}

fn open_store(cwd: &Path) -> FileStore {
    FileStore::new(find_store_dir(cwd))
}

fn cmd_add(cwd: &Path, text: &str) -> color_eyre::Result<()> {
    let store = open_store(cwd);
    let mut checklist = load_checklist(&store);

    let Some(id) = checklist.add(text) else {
        bail!("Task text cannot be empty");
    };

    save_checklist(&store, &checklist)?;
    record_activity(&store, "add", id, text.trim());
    println!("Created task {id}: {}", text.trim());
    Ok(())
}

fn cmd_list(cwd: &Path, filter: Filter) -> color_eyre::Result<()> {
    let store = open_store(cwd);
    let checklist = load_checklist(&store);

    let tasks: Vec<_> = checklist
        .tasks
        .iter()
        .filter(|t| filter.matches(t))
        .collect();

    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    for task in tasks {
        let marker = if task.done { "[x]" } else { "[ ]" };
        println!("{:>4}  {marker} {}", task.id, task.text);
    }
    println!(
        "\n{} open, {} done",
        checklist.active_count(),
        checklist.completed_count()
    );
    Ok(())
}

fn cmd_toggle(cwd: &Path, id: u64) -> color_eyre::Result<()> {
    let store = open_store(cwd);
    let mut checklist = load_checklist(&store);

    if !checklist.toggle(id) {
        bail!("Task {id} not found");
    }

    save_checklist(&store, &checklist)?;
    let (done, text) = checklist
        .find(id)
        .map(|t| (t.done, t.text.clone()))
        .unwrap_or_default();
    record_activity(&store, "toggle", id, &text);
    println!(
        "Task {id} marked {}",
        if done { "done" } else { "not done" }
    );
    Ok(())
}

fn cmd_edit(cwd: &Path, id: u64, text: &str) -> color_eyre::Result<()> {
    let store = open_store(cwd);
    let mut checklist = load_checklist(&store);

    if checklist.find(id).is_none() {
        bail!("Task {id} not found");
    }
    if !checklist.rename(id, text) {
        bail!("Task text cannot be empty");
    }

    save_checklist(&store, &checklist)?;
    record_activity(&store, "edit", id, text.trim());
    println!("Updated task {id}: {}", text.trim());
    Ok(())
}

fn cmd_delete(cwd: &Path, id: u64) -> color_eyre::Result<()> {
    let store = open_store(cwd);
    let mut checklist = load_checklist(&store);

    let Some(task) = checklist.remove(id) else {
        bail!("Task {id} not found");
    };

    save_checklist(&store, &checklist)?;
    record_activity(&store, "delete", id, &task.text);
    println!("Deleted task {id}: {}", task.text);
    Ok(())
}

fn cmd_log(cwd: &Path) -> color_eyre::Result<()> {
    use std::io::{self, BufRead, BufWriter, ErrorKind, Write};

    let store_dir = find_store_dir(cwd);
    let log_path = store_dir.join("activity.log");

    let file = match std::fs::File::open(&log_path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).wrap_err("failed to open activity.log"),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in io::BufReader::new(file).lines() {
        let line = line.wrap_err("error reading activity.log")?;
        match writeln!(out, "{line}") {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::BrokenPipe => return Ok(()),
            Err(e) => return Err(e).wrap_err("error writing to stdout"),
        }
    }
    // Flush explicitly — BufWriter silently drops flush errors on drop.
    // Treat BrokenPipe as a clean exit (consumer closed the pipe).
    if let Err(e) = out.flush() {
        if e.kind() != ErrorKind::BrokenPipe {
            return Err(e).wrap_err("error flushing stdout");
        }
    }
    Ok(())
}

fn cmd_tui(cwd: &Path) -> color_eyre::Result<()> {
    let store = open_store(cwd);
    let local_config = load_local_config(store.dir())?;

    let mut terminal = ratatui::init();
    let result = app::run(&mut terminal, &store, local_config);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn make_store_dir(parent: &Path) -> PathBuf {
        let store_dir = parent.join(".checklist");
        fs::create_dir(&store_dir).unwrap();
        store_dir
    }

    #[test]
    fn cmd_add_creates_store_and_task() {
        let dir = tempfile::tempdir().unwrap();
        cmd_add(dir.path(), "buy milk").unwrap();

        let store = open_store(dir.path());
        let checklist = load_checklist(&store);
        assert_eq!(checklist.tasks.len(), 1);
        assert_eq!(checklist.tasks[0].text, "buy milk");
        assert_eq!(checklist.tasks[0].id, 1);
        assert!(dir.path().join(".checklist").join("checklist.json").exists());
    }

    #[test]
    fn cmd_add_rejects_blank_text() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_add(dir.path(), "   ").is_err());
        assert!(!dir.path().join(".checklist").exists());
    }

    #[test]
    fn cmd_toggle_flips_done() {
        let dir = tempfile::tempdir().unwrap();
        cmd_add(dir.path(), "a").unwrap();
        cmd_toggle(dir.path(), 1).unwrap();

        let store = open_store(dir.path());
        assert!(load_checklist(&store).tasks[0].done);
    }

    #[test]
    fn cmd_toggle_unknown_id_errors() {
        let dir = tempfile::tempdir().unwrap();
        cmd_add(dir.path(), "a").unwrap();
        let err = cmd_toggle(dir.path(), 99).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn cmd_edit_replaces_text() {
        let dir = tempfile::tempdir().unwrap();
        cmd_add(dir.path(), "old").unwrap();
        cmd_edit(dir.path(), 1, "new").unwrap();

        let store = open_store(dir.path());
        assert_eq!(load_checklist(&store).tasks[0].text, "new");
    }

    #[test]
    fn cmd_delete_removes_task() {
        let dir = tempfile::tempdir().unwrap();
        cmd_add(dir.path(), "a").unwrap();
        cmd_add(dir.path(), "b").unwrap();
        cmd_delete(dir.path(), 1).unwrap();

        let store = open_store(dir.path());
        let checklist = load_checklist(&store);
        assert_eq!(checklist.tasks.len(), 1);
        assert_eq!(checklist.tasks[0].id, 2);
    }

    #[test]
    fn ids_are_not_reused_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        cmd_add(dir.path(), "a").unwrap();
        cmd_delete(dir.path(), 1).unwrap();
        cmd_add(dir.path(), "b").unwrap();

        let store = open_store(dir.path());
        assert_eq!(load_checklist(&store).tasks[0].id, 2);
    }

    #[test]
    fn cmd_log_no_store_dir_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_log(dir.path()).is_ok());
    }

    #[test]
    fn cmd_log_no_activity_log_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        make_store_dir(dir.path());
        assert!(cmd_log(dir.path()).is_ok());
    }

    #[test]
    fn cmd_log_valid_jsonl_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = make_store_dir(dir.path());
        fs::write(
            store_dir.join("activity.log"),
            "{\"action\":\"add\",\"id\":1}\n{\"action\":\"toggle\",\"id\":1}\n",
        )
        .unwrap();
        assert!(cmd_log(dir.path()).is_ok());
    }

    #[test]
    fn cmd_log_non_utf8_content_returns_err() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = make_store_dir(dir.path());
        fs::write(store_dir.join("activity.log"), b"\xFF\xFE{}\n").unwrap();
        let err = cmd_log(dir.path()).unwrap_err();
        assert!(
            format!("{err:#}").contains("error reading activity.log"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn cmd_log_nested_cwd_finds_store_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = make_store_dir(dir.path());
        // Write a real log so we confirm the file was reached via the ancestor walk
        fs::write(store_dir.join("activity.log"), "{\"action\":\"add\"}\n").unwrap();
        let nested = dir.path().join("sub").join("sub2");
        fs::create_dir_all(&nested).unwrap();
        assert!(cmd_log(&nested).is_ok());
    }

    #[test]
    fn commands_record_activity() {
        let dir = tempfile::tempdir().unwrap();
        cmd_add(dir.path(), "a").unwrap();
        cmd_toggle(dir.path(), 1).unwrap();
        cmd_delete(dir.path(), 1).unwrap();

        let log = fs::read_to_string(
            dir.path().join(".checklist").join("activity.log"),
        )
        .unwrap();
        let actions: Vec<&str> = log.lines().collect();
        assert_eq!(actions.len(), 3);
        assert!(actions[0].contains("\"action\":\"add\""));
        assert!(actions[1].contains("\"action\":\"toggle\""));
        assert!(actions[2].contains("\"action\":\"delete\""));
    }
}
