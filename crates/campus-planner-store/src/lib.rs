//! Key-value persistence for campus-planner tasks and settings.

mod error;
pub mod interchange;

pub use error::{FormatError, PersistenceError};
pub use interchange::{ExportArtifact, export_tasks, importable_tasks, parse_import};

use anyhow::{Context, Result};
use campus_planner_core::{Settings, Task};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default key holding the JSON task array.
pub const DEFAULT_TASKS_KEY: &str = "campus_tasks";
/// Default key holding the JSON settings object.
pub const DEFAULT_SETTINGS_KEY: &str = "campus_settings";

/// Minimal string key-value backend.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error when the backend rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        check_key(key).map_err(|reason| PersistenceError::Rejected {
            key: key.to_owned(),
            reason: reason.into(),
        })?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Check that `key` is usable as an entry name.
///
/// Keys double as file names, so only ASCII letters, digits, `_`, `-` and `.`
/// are accepted, and a key may not start with `.`.
///
/// # Errors
/// Returns the reason the key is unusable.
pub fn check_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("keys must not be empty");
    }
    if key.starts_with('.') {
        return Err("keys must not start with '.'");
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err("keys may only contain letters, digits, '_', '-' and '.'");
    }
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "Wrote entry");
        Ok(())
    }
}

/// In-memory store with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Unlimited empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store that rejects writes once the stored values exceed `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    /// Seed an entry directly, bypassing the quota.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if let Some(quota) = self.quota {
            let others: usize = self
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > quota {
                return Err(PersistenceError::Rejected {
                    key: key.to_owned(),
                    reason: format!("quota of {quota} bytes exceeded"),
                });
            }
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Names of the two entries holding the application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Entry holding the task array.
    pub tasks: String,
    /// Entry holding the settings object.
    pub settings: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_TASKS_KEY.to_owned(),
            settings: DEFAULT_SETTINGS_KEY.to_owned(),
        }
    }
}

/// Non-fatal problem found while loading persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Entry that could not be used.
    pub key: String,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not load '{}', starting empty: {}", self.key, self.message)
    }
}

/// State recovered at startup.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    /// Tasks in stored order.
    pub tasks: Vec<Task>,
    /// Weekly settings.
    pub settings: Settings,
    /// Entries that were present but unusable.
    pub warnings: Vec<LoadWarning>,
}

/// Reads and writes tasks + settings through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct Persistence<K> {
    backend: K,
    keys: StorageKeys,
}

impl<K: KeyValueStore> Persistence<K> {
    /// Wrap a backend using the given entry names.
    pub const fn new(backend: K, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    /// Borrow the backend.
    pub const fn backend(&self) -> &K {
        &self.backend
    }

    /// Entry names in use.
    pub const fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Load tasks and settings. Missing entries yield defaults; unreadable or
    /// unparseable entries yield defaults plus a warning.
    pub fn load(&self) -> Loaded {
        let mut warnings = Vec::new();
        let tasks = self.load_entry::<Vec<Task>>(&self.keys.tasks, &mut warnings);
        let settings = self.load_entry::<Settings>(&self.keys.settings, &mut warnings);
        info!(tasks = tasks.len(), warnings = warnings.len(), "Loaded state");
        Loaded {
            tasks,
            settings,
            warnings,
        }
    }

    fn load_entry<T>(&self, key: &str, warnings: &mut Vec<LoadWarning>) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(err) => {
                warn!(%key, error = %err, "Failed to read entry");
                warnings.push(LoadWarning {
                    key: key.to_owned(),
                    message: err.to_string(),
                });
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(%key, error = %err, "Failed to parse entry");
            warnings.push(LoadWarning {
                key: key.to_owned(),
                message: err.to_string(),
            });
            T::default()
        })
    }

    /// Write both entries. When the settings write fails the tasks entry is put
    /// back to its previous value.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] if serialization fails or the backend rejects a write.
    pub fn save(&mut self, tasks: &[Task], settings: &Settings) -> Result<(), PersistenceError> {
        let tasks_json = encode(&self.keys.tasks, tasks)?;
        let settings_json = encode(&self.keys.settings, settings)?;
        let previous = self.backend.get(&self.keys.tasks).ok().flatten();
        self.backend.set(&self.keys.tasks, &tasks_json)?;
        if let Err(err) = self.backend.set(&self.keys.settings, &settings_json) {
            // A missing entry and an empty array load the same way.
            let restore = previous.as_deref().unwrap_or("[]");
            if let Err(restore_err) = self.backend.set(&self.keys.tasks, restore) {
                warn!(key = %self.keys.tasks, error = %restore_err, "Failed to restore entry after partial save");
            }
            return Err(err);
        }
        info!(tasks = tasks.len(), "Saved state");
        Ok(())
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value).map_err(|source| PersistenceError::Serialize {
        key: key.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_planner_core::id::TaskId;
    use campus_planner_core::{DueDate, Task};
    use time::macros::datetime;

    fn sample() -> Task {
        Task {
            id: TaskId::from("rec_1"),
            title: "Plan week".into(),
            due_date: DueDate::new_unchecked("2025-03-05"),
            duration_minutes: 25.0,
            tag: "admin".into(),
            description: String::new(),
            completed: false,
            created_at: Some(datetime!(2025-03-01 09:00 UTC)),
            updated_at: Some(datetime!(2025-03-01 09:00 UTC)),
        }
    }

    fn settings() -> Settings {
        Settings {
            weekly_target: 300.0,
            weekly_cap: 600.0,
        }
    }

    #[test]
    fn missing_entries_load_defaults_without_warnings() {
        let persistence = Persistence::new(MemoryStore::new(), StorageKeys::default());
        let loaded = persistence.load();
        assert!(loaded.tasks.is_empty());
        assert_eq!(loaded.settings, Settings::default());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn save_then_load_roundtrip() -> anyhow::Result<()> {
        let mut persistence = Persistence::new(MemoryStore::new(), StorageKeys::default());
        persistence.save(&[sample()], &settings())?;

        let raw = persistence
            .backend()
            .raw(DEFAULT_TASKS_KEY)
            .unwrap_or_else(|| panic!("tasks entry must be written"));
        assert!(raw.starts_with('['));

        let loaded = persistence.load();
        assert_eq!(loaded.tasks, vec![sample()]);
        assert_eq!(loaded.settings, settings());
        Ok(())
    }

    #[test]
    fn corrupt_entry_degrades_to_default_with_warning() {
        let backend = MemoryStore::new()
            .with_entry(DEFAULT_TASKS_KEY, "{not json")
            .with_entry(DEFAULT_SETTINGS_KEY, r#"{"weeklyTarget": 90}"#);
        let persistence = Persistence::new(backend, StorageKeys::default());
        let loaded = persistence.load();
        assert!(loaded.tasks.is_empty());
        assert!((loaded.settings.weekly_target - 90.0).abs() < f64::EPSILON);
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].key, DEFAULT_TASKS_KEY);
    }

    #[test]
    fn quota_rejection_surfaces_as_persistence_error() {
        let mut persistence = Persistence::new(MemoryStore::with_quota(16), StorageKeys::default());
        let Err(err) = persistence.save(&[sample()], &settings()) else {
            panic!("write over quota must fail");
        };
        assert!(matches!(err, PersistenceError::Rejected { .. }));
    }

    #[test]
    fn rejected_settings_write_restores_tasks_entry() -> anyhow::Result<()> {
        let previous = encode(DEFAULT_TASKS_KEY, &[sample()])?;
        let mut second = sample();
        second.id = TaskId::from("rec_2");
        let next = [sample(), second];
        let quota = encode(DEFAULT_TASKS_KEY, &next)?.len();

        // Room for the new tasks entry, none left for settings.
        let backend = MemoryStore::with_quota(quota).with_entry(DEFAULT_TASKS_KEY, &previous);
        let mut persistence = Persistence::new(backend, StorageKeys::default());
        let Err(err) = persistence.save(&next, &settings()) else {
            panic!("settings write over quota must fail");
        };
        assert!(matches!(err, PersistenceError::Rejected { ref key, .. } if key == DEFAULT_SETTINGS_KEY));
        assert_eq!(persistence.backend().raw(DEFAULT_TASKS_KEY), Some(previous.as_str()));
        assert_eq!(persistence.load().tasks, vec![sample()]);
        Ok(())
    }

    #[test]
    fn rejected_first_save_leaves_no_tasks() -> anyhow::Result<()> {
        let quota = encode(DEFAULT_TASKS_KEY, &[sample()])?.len();
        let mut persistence = Persistence::new(MemoryStore::with_quota(quota), StorageKeys::default());
        assert!(persistence.save(&[sample()], &settings()).is_err());
        assert!(persistence.load().tasks.is_empty());
        Ok(())
    }

    #[test]
    fn check_key_accepts_file_safe_names_only() {
        assert!(check_key("campus_tasks").is_ok());
        assert!(check_key("spring-2025.v2").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key(".hidden").is_err());
        assert!(check_key("my tasks").is_err());
        assert!(check_key("../escape").is_err());
    }

    #[test]
    fn file_store_roundtrip_and_missing_key() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path().join("data"))?;
        assert_eq!(store.get("campus_tasks")?, None);

        store.set("campus_tasks", "[]")?;
        assert_eq!(store.get("campus_tasks")?.as_deref(), Some("[]"));
        assert!(store.dir().join("campus_tasks.json").exists());
        assert!(!store.dir().join("campus_tasks.json.tmp").exists());
        Ok(())
    }

    #[test]
    fn file_store_rejects_path_like_keys() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;
        assert!(matches!(
            store.set("../escape", "x"),
            Err(PersistenceError::Rejected { .. })
        ));
        assert!(store.get(".hidden").is_err());
        Ok(())
    }
}
