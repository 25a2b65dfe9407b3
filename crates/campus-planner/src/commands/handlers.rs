use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use campus_planner_app::{Clock, TaskService, import_file};
use campus_planner_core::id::TaskId;
use campus_planner_core::{Settings, SortKey, TaskInput, validate_settings};
use campus_planner_store::KeyValueStore;

use super::render;
use crate::OutputFormat;

/// Replacement values for `edit`; `None` keeps the current value.
pub struct EditFields {
    pub title: Option<String>,
    pub date: Option<String>,
    pub duration: Option<String>,
    pub tag: Option<String>,
    pub note: Option<String>,
}

pub fn handle_add<K: KeyValueStore, C: Clock>(
    service: &mut TaskService<K, C>,
    title: String,
    date: String,
    duration: String,
    tag: String,
    note: Option<String>,
) -> Result<()> {
    let task = service.store_mut().create(&TaskInput {
        title,
        due_date: date,
        duration,
        tag,
        description: note,
    })?;
    println!("created task: {} ({})", task.id, task.title);
    Ok(())
}

pub fn handle_edit<K: KeyValueStore, C: Clock>(
    service: &mut TaskService<K, C>,
    id: &TaskId,
    fields: EditFields,
) -> Result<()> {
    let store = service.store_mut();
    let mut input = TaskInput::from(store.begin_edit(id)?);
    let EditFields {
        title,
        date,
        duration,
        tag,
        note,
    } = fields;
    if let Some(title) = title {
        input.title = title;
    }
    if let Some(date) = date {
        input.due_date = date;
    }
    if let Some(duration) = duration {
        input.duration = duration;
    }
    if let Some(tag) = tag {
        input.tag = tag;
    }
    if let Some(note) = note {
        input.description = Some(note);
    }

    let result = store.submit(&input);
    // Each invocation is its own edit session.
    store.cancel_edit();
    let task = result?;
    println!("updated task: {} ({})", task.id, task.title);
    Ok(())
}

pub fn handle_rm<K: KeyValueStore, C: Clock>(service: &mut TaskService<K, C>, id: &TaskId) -> Result<()> {
    if service.store_mut().remove(id)? {
        println!("removed task: {id}");
    } else {
        println!("task {id} not found, nothing removed");
    }
    Ok(())
}

pub fn handle_toggle<K: KeyValueStore, C: Clock>(service: &mut TaskService<K, C>, id: &TaskId) -> Result<()> {
    let Some(task) = service.store_mut().toggle_completion(id)? else {
        println!("task {id} not found, nothing changed");
        return Ok(());
    };
    let state = if task.completed { "complete" } else { "pending" };
    println!("{}: marked {state}", task.id);
    Ok(())
}

pub fn handle_ls<K: KeyValueStore, C: Clock>(
    service: &TaskService<K, C>,
    search: &str,
    sort: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let sort = sort.map(|name| SortKey::from_name(Some(name)));
    let tasks = service.list(search, sort);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        if search.trim().is_empty() {
            println!("No tasks found");
        } else {
            println!("No tasks matched the provided filters");
        }
        return Ok(());
    }
    print!("{}", render::task_table(&tasks));
    Ok(())
}

pub fn handle_stats<K: KeyValueStore, C: Clock>(service: &TaskService<K, C>, format: OutputFormat) -> Result<()> {
    let dashboard = service.dashboard();
    match format {
        OutputFormat::Table => print!("{}", render::dashboard(&dashboard)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
    }
    Ok(())
}

pub fn handle_settings<K: KeyValueStore, C: Clock>(
    service: &mut TaskService<K, C>,
    target: Option<String>,
    cap: Option<String>,
) -> Result<()> {
    let current = *service.store().settings();
    if target.is_none() && cap.is_none() {
        print!("{}", render::settings(&current));
        return Ok(());
    }

    let target = target.unwrap_or_else(|| current.weekly_target.to_string());
    let cap = cap.unwrap_or_else(|| current.weekly_cap.to_string());
    let settings: Settings = validate_settings(&target, &cap)?;
    service.store_mut().update_settings(settings)?;
    print!("{}", render::settings(&settings));
    Ok(())
}

pub fn handle_export<K: KeyValueStore, C: Clock>(service: &TaskService<K, C>, output: Option<PathBuf>) -> Result<()> {
    let artifact = service.export()?;
    let dir = output.unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "exported {} tasks to {}",
        service.store().tasks().len(),
        path.display()
    );
    Ok(())
}

pub fn handle_import<K: KeyValueStore, C: Clock>(service: &mut TaskService<K, C>, file: &Path) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let added = runtime
        .block_on(import_file(service, file))
        .with_context(|| format!("failed to import {}", file.display()))?;
    println!("Imported {added} tasks");
    Ok(())
}
