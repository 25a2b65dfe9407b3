use std::path::Path;

use anyhow::{Context, Result};
use campus_planner_core::{Dashboard, SortKey, Task, query};
use campus_planner_store::{ExportArtifact, FileStore, KeyValueStore, LoadWarning, Persistence, PersistenceError, export_tasks};

use crate::clock::{Clock, SystemClock};
use crate::config::ProjectConfig;
use crate::task_store::TaskStore;

/// Service façade tying the task store to configuration and derived views.
pub struct TaskService<K, C = SystemClock> {
    store: TaskStore<K, C>,
    config: ProjectConfig,
}

impl TaskService<FileStore, SystemClock> {
    /// Open the file-backed store in `data_dir`, reading `config.toml` from the same place.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the directory cannot be created.
    pub fn open_dir(data_dir: impl AsRef<Path>) -> Result<(Self, Vec<LoadWarning>)> {
        let data_dir = data_dir.as_ref();
        let backend = FileStore::open(data_dir)?;
        let config = ProjectConfig::from_dir(data_dir)
            .with_context(|| format!("failed to load configuration from {}", data_dir.display()))?;
        Ok(Self::new(backend, SystemClock, config))
    }
}

impl<K: KeyValueStore, C: Clock> TaskService<K, C> {
    /// Load state from `backend` using the entry names in `config`.
    pub fn new(backend: K, clock: C, config: ProjectConfig) -> (Self, Vec<LoadWarning>) {
        let persistence = Persistence::new(backend, config.storage.keys());
        let (store, warnings) = TaskStore::open(persistence, clock);
        (Self { store, config }, warnings)
    }

    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub const fn store(&self) -> &TaskStore<K, C> {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut TaskStore<K, C> {
        &mut self.store
    }

    /// Filtered, ordered view. `None` uses the configured default order.
    pub fn list(&self, filter: &str, sort: Option<SortKey>) -> Vec<&Task> {
        let key = sort.unwrap_or_else(|| self.config.display.sort_key());
        query(self.store.tasks(), filter, key)
    }

    /// Dashboard metrics as of the store's clock.
    pub fn dashboard(&self) -> Dashboard {
        Dashboard::compute(self.store.tasks(), self.store.settings(), self.store.clock().now())
    }

    /// Export every task with the configured file name prefix.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] if serialization fails.
    pub fn export(&self) -> Result<ExportArtifact, PersistenceError> {
        export_tasks(self.store.tasks(), &self.config.export.prefix, self.store.clock().now())
    }
}
