use std::str::FromStr;

use anyhow::{Context, Result, bail};
use campus_planner_app::{Clock, TaskService};
use campus_planner_core::format::minutes_to_hours;
use campus_planner_core::id::TaskId;
use campus_planner_store::KeyValueStore;

use crate::Command;

mod handlers;
mod render;

/// Dispatch a data-directory command against `service`.
pub fn run<K: KeyValueStore, C: Clock>(command: Command, service: &mut TaskService<K, C>) -> Result<()> {
    match command {
        Command::Add {
            title,
            date,
            duration,
            tag,
            note,
        } => handlers::handle_add(service, title, date, duration, tag, note),
        Command::Edit {
            id,
            title,
            date,
            duration,
            tag,
            note,
        } => handlers::handle_edit(
            service,
            &parse_task_id(&id)?,
            handlers::EditFields {
                title,
                date,
                duration,
                tag,
                note,
            },
        ),
        Command::Rm { id } => handlers::handle_rm(service, &parse_task_id(&id)?),
        Command::Toggle { id } => handlers::handle_toggle(service, &parse_task_id(&id)?),
        Command::Ls { search, sort, format } => {
            handlers::handle_ls(service, search.as_deref().unwrap_or_default(), sort.as_deref(), format)
        }
        Command::Stats { format } => handlers::handle_stats(service, format),
        Command::Settings { target, cap } => handlers::handle_settings(service, target, cap),
        Command::Export { output } => handlers::handle_export(service, output),
        Command::Import { file } => handlers::handle_import(service, &file),
        Command::Convert { minutes } => convert(minutes),
    }
}

/// Print the hours equivalent of `minutes`.
pub fn convert(minutes: f64) -> Result<()> {
    let Some(line) = minutes_to_hours(minutes) else {
        bail!("enter a positive number of minutes");
    };
    println!("{line}");
    Ok(())
}

fn parse_task_id(raw: &str) -> Result<TaskId> {
    TaskId::from_str(raw).with_context(|| format!("Invalid task id: {raw:?}"))
}
