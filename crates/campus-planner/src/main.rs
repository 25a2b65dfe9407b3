//! CLI entry point for campus-planner.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use campus_planner_app::TaskService;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

const APP_DIR: &str = "campus-planner";

/// Personal task and time tracker with weekly targets.
#[derive(Parser, Debug)]
#[command(
    name = "campus-planner",
    version,
    about = "campus-planner: tasks, durations and weekly time targets kept in a local data directory"
)]
struct Cli {
    /// Data directory (defaults to the platform's local data dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new task.
    Add {
        #[arg(long)]
        title: String,
        /// Due date, `YYYY-MM-DD`.
        #[arg(long)]
        date: String,
        /// Planned minutes.
        #[arg(long)]
        duration: String,
        #[arg(long)]
        tag: String,
        #[arg(long)]
        note: Option<String>,
    },

    /// Edit an existing task. Omitted fields keep their current value.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },

    /// Delete a task.
    Rm { id: String },

    /// Flip a task between complete and pending.
    Toggle { id: String },

    /// List tasks.
    Ls {
        /// Regular expression, plain text, or `@tag:<word>`.
        #[arg(long)]
        search: Option<String>,
        /// date-desc, date-asc, title-asc, title-desc, duration-desc, duration-asc.
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show dashboard metrics.
    Stats {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show or change the weekly target and cap (minutes, empty = 0).
    Settings {
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        cap: Option<String>,
    },

    /// Write every task to `<prefix>-<date>.json`.
    Export {
        /// Directory receiving the file (defaults to current).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Merge tasks from a previously exported file.
    Import { file: PathBuf },

    /// Convert minutes to hours.
    Convert { minutes: f64 },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let Cli { data_dir, cmd } = Cli::parse();
    install_tracing();

    if let Command::Convert { minutes } = cmd {
        return commands::convert(minutes);
    }

    let data_dir = resolve_data_dir(data_dir)?;
    let (mut service, warnings) = TaskService::open_dir(&data_dir)?;
    for warning in &warnings {
        warn!("{warning}");
    }
    commands::run(cmd, &mut service)
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| anyhow!("could not determine a data directory; pass --data-dir"))
}

fn install_tracing() {
    // RUST_LOG overrides the default WARN level. Logs go to stderr so JSON output stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_add_command() {
        let cli = Cli::parse_from([
            "campus-planner",
            "--data-dir",
            "/tmp/planner",
            "add",
            "--title",
            "Finish lab report",
            "--date",
            "2025-03-07",
            "--duration",
            "90",
            "--tag",
            "lab",
        ]);

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/planner")));
        match cli.cmd {
            Command::Add {
                title,
                date,
                duration,
                tag,
                note,
            } => {
                assert_eq!(title, "Finish lab report");
                assert_eq!(date, "2025-03-07");
                assert_eq!(duration, "90");
                assert_eq!(tag, "lab");
                assert!(note.is_none());
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn parse_ls_with_defaults() {
        let cli = Cli::parse_from(["campus-planner", "ls", "--search", "@tag:work"]);
        match cli.cmd {
            Command::Ls { search, sort, format } => {
                assert_eq!(search.as_deref(), Some("@tag:work"));
                assert!(sort.is_none());
                assert_eq!(format, OutputFormat::Table);
            }
            _ => panic!("expected ls command"),
        }
    }

    #[test]
    fn data_dir_flag_is_global() {
        let cli = Cli::parse_from(["campus-planner", "stats", "--format", "json", "--data-dir", "/tmp/x"]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.cmd,
            Command::Stats {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn parse_edit_keeps_unset_fields_empty() {
        let cli = Cli::parse_from(["campus-planner", "edit", "rec_1", "--tag", "admin"]);
        match cli.cmd {
            Command::Edit { id, title, tag, .. } => {
                assert_eq!(id, "rec_1");
                assert!(title.is_none());
                assert_eq!(tag.as_deref(), Some("admin"));
            }
            _ => panic!("expected edit command"),
        }
    }

    #[test]
    fn explicit_data_dir_wins() -> Result<()> {
        let dir = resolve_data_dir(Some(PathBuf::from("/srv/planner")))?;
        assert_eq!(dir, PathBuf::from("/srv/planner"));
        Ok(())
    }
}
