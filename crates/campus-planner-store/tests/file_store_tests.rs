#![allow(missing_docs)]

use anyhow::Result;
use campus_planner_core::id::TaskId;
use campus_planner_core::{DueDate, Settings, Task};
use campus_planner_store::{
    FileStore, KeyValueStore, Persistence, StorageKeys, export_tasks, importable_tasks, parse_import,
};
use std::fs;
use time::macros::datetime;

fn task(id: &str, title: &str) -> Task {
    Task {
        id: TaskId::from(id),
        title: title.into(),
        due_date: DueDate::new_unchecked("2025-03-07"),
        duration_minutes: 45.0,
        tag: "study".into(),
        description: "notes".into(),
        completed: false,
        created_at: Some(datetime!(2025-03-05 08:30 UTC)),
        updated_at: Some(datetime!(2025-03-05 08:30 UTC)),
    }
}

#[test]
fn test_state_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = Settings {
        weekly_target: 600.0,
        weekly_cap: 900.0,
    };
    {
        let mut persistence = Persistence::new(FileStore::open(dir.path())?, StorageKeys::default());
        persistence.save(&[task("rec_1", "Read chapter")], &settings)?;
    }

    let persistence = Persistence::new(FileStore::open(dir.path())?, StorageKeys::default());
    let loaded = persistence.load();
    assert!(loaded.warnings.is_empty());
    assert_eq!(loaded.tasks, vec![task("rec_1", "Read chapter")]);
    assert_eq!(loaded.settings, settings);
    Ok(())
}

#[test]
fn test_custom_keys_use_separate_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let keys = StorageKeys {
        tasks: "spring_tasks".into(),
        settings: "spring_settings".into(),
    };
    let mut persistence = Persistence::new(FileStore::open(dir.path())?, keys);
    persistence.save(&[], &Settings::default())?;

    assert!(dir.path().join("spring_tasks.json").exists());
    assert!(dir.path().join("spring_settings.json").exists());
    assert!(!dir.path().join("campus_tasks.json").exists());
    Ok(())
}

#[test]
fn test_legacy_records_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("campus_tasks.json"),
        r#"[{"id":"rec_1700000000000","title":"Old entry","date":"2024-11-02","time":25,"tag":"misc","desc":null,"done":true,"created":"2024-11-01T10:00:00Z"}]"#,
    )?;
    let persistence = Persistence::new(FileStore::open(dir.path())?, StorageKeys::default());
    let loaded = persistence.load();

    assert!(loaded.warnings.is_empty());
    let [old] = loaded.tasks.as_slice() else {
        panic!("expected one legacy task, got {:?}", loaded.tasks);
    };
    assert!(old.completed);
    assert_eq!(old.due_date.as_str(), "2024-11-02");
    assert_eq!(old.description, "");
    assert!(old.updated_at.is_none());
    Ok(())
}

#[test]
fn test_export_file_imports_back() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let tasks = vec![task("rec_1", "Read chapter"), task("rec_2", "Lab prep")];
    let artifact = export_tasks(&tasks, "campus-tasks", datetime!(2025-03-05 18:00 UTC))?;

    let mut store = FileStore::open(dir.path())?;
    store.set("exported", std::str::from_utf8(&artifact.bytes)?)?;
    let raw = store.get("exported")?.unwrap_or_default();

    let imported = importable_tasks(parse_import(raw.as_bytes())?)?;
    assert_eq!(imported, tasks);
    Ok(())
}
