use std::collections::HashSet;

use campus_planner_core::id::TaskId;
use campus_planner_core::{Settings, Task, TaskInput, ValidationError, validate_task};
use campus_planner_store::{
    FormatError, KeyValueStore, LoadWarning, Persistence, PersistenceError, importable_tasks, parse_import,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};

/// Errors surfaced by [`TaskStore`].
#[derive(thiserror::Error, Debug)]
pub enum TaskStoreError {
    /// Input failed validation; nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Target task could not be found.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// Import artifact was unusable.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Durable store refused the change; in-memory state was restored.
    #[error("store error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// In-memory state saved before a mutation so a failed write can be undone.
struct Snapshot {
    tasks: Vec<Task>,
    settings: Settings,
    editing: Option<TaskId>,
}

/// Ordered task collection plus weekly settings, persisted after every change.
pub struct TaskStore<K, C = SystemClock> {
    persistence: Persistence<K>,
    clock: C,
    tasks: Vec<Task>,
    settings: Settings,
    editing: Option<TaskId>,
}

impl<K: KeyValueStore, C: Clock> TaskStore<K, C> {
    /// Load persisted state. Unreadable entries start empty and are reported as warnings.
    pub fn open(persistence: Persistence<K>, clock: C) -> (Self, Vec<LoadWarning>) {
        let loaded = persistence.load();
        let store = Self {
            persistence,
            clock,
            tasks: loaded.tasks,
            settings: loaded.settings,
            editing: None,
        };
        (store, loaded.warnings)
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Current weekly settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Clock used to stamp mutations.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Persistence adapter backing this store.
    pub const fn persistence(&self) -> &Persistence<K> {
        &self.persistence
    }

    /// Look up a task by id.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    /// Validate `input` and append a new task.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::Validation`] without changing anything, or
    /// [`TaskStoreError::Persistence`] after restoring the previous state.
    pub fn create(&mut self, input: &TaskInput) -> Result<Task, TaskStoreError> {
        let fields = validate_task(input)?;
        let snapshot = self.snapshot();
        let task = Task::create(fields, self.clock.now());
        self.tasks.push(task.clone());
        self.commit(snapshot)?;
        info!(id = %task.id, "Created task");
        Ok(task)
    }

    /// Replace the editable fields of an existing task.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::NotFound`] for unknown ids, validation failures,
    /// or persistence failures (state restored).
    pub fn update(&mut self, id: &TaskId, input: &TaskInput) -> Result<Task, TaskStoreError> {
        let fields = validate_task(input)?;
        let index = self.position(id).ok_or_else(|| TaskStoreError::NotFound(id.clone()))?;
        let snapshot = self.snapshot();
        let now = self.clock.now();
        self.tasks[index].apply_edit(fields, now);
        let task = self.tasks[index].clone();
        self.commit(snapshot)?;
        info!(id = %task.id, "Updated task");
        Ok(task)
    }

    /// Mark `id` as the pending edit target, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::NotFound`] for unknown ids.
    pub fn begin_edit(&mut self, id: &TaskId) -> Result<&Task, TaskStoreError> {
        let index = self.position(id).ok_or_else(|| TaskStoreError::NotFound(id.clone()))?;
        self.editing = Some(id.clone());
        Ok(&self.tasks[index])
    }

    /// Drop the pending edit target.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Pending edit target, if any.
    pub const fn editing(&self) -> Option<&TaskId> {
        self.editing.as_ref()
    }

    /// Update the pending edit target, or create a task when nothing is pending.
    /// The target is cleared only when the update succeeds.
    ///
    /// # Errors
    /// Same as [`Self::update`] / [`Self::create`].
    pub fn submit(&mut self, input: &TaskInput) -> Result<Task, TaskStoreError> {
        let Some(id) = self.editing.clone() else {
            return self.create(input);
        };
        match self.update(&id, input) {
            Ok(task) => {
                self.editing = None;
                Ok(task)
            }
            Err(err @ TaskStoreError::NotFound(_)) => {
                self.editing = None;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Delete a task. Returns `false` (and does nothing) for unknown ids.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::Persistence`] after restoring the previous state.
    pub fn remove(&mut self, id: &TaskId) -> Result<bool, TaskStoreError> {
        let Some(index) = self.position(id) else {
            debug!(%id, "Remove ignored, task not found");
            return Ok(false);
        };
        let snapshot = self.snapshot();
        self.tasks.remove(index);
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        self.commit(snapshot)?;
        info!(%id, "Removed task");
        Ok(true)
    }

    /// Flip completion. Returns `None` (and does nothing) for unknown ids.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::Persistence`] after restoring the previous state.
    pub fn toggle_completion(&mut self, id: &TaskId) -> Result<Option<Task>, TaskStoreError> {
        let Some(index) = self.position(id) else {
            debug!(%id, "Toggle ignored, task not found");
            return Ok(None);
        };
        let snapshot = self.snapshot();
        let now = self.clock.now();
        self.tasks[index].toggle_completion(now);
        let task = self.tasks[index].clone();
        self.commit(snapshot)?;
        Ok(Some(task))
    }

    /// Replace the weekly settings.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::Persistence`] after restoring the previous state.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), TaskStoreError> {
        let snapshot = self.snapshot();
        self.settings = settings;
        self.commit(snapshot)?;
        info!(weekly_target = settings.weekly_target, weekly_cap = settings.weekly_cap, "Updated settings");
        Ok(())
    }

    /// Append imported records whose id is not yet known. Returns how many were added.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::Format`] when no record is well-formed, or
    /// [`TaskStoreError::Persistence`] after restoring the previous state.
    pub fn import_batch(&mut self, records: Vec<Value>) -> Result<usize, TaskStoreError> {
        let candidates = importable_tasks(records)?;
        let mut known: HashSet<TaskId> = self.tasks.iter().map(|task| task.id.clone()).collect();
        let snapshot = self.snapshot();
        let before = self.tasks.len();
        for task in candidates {
            if known.insert(task.id.clone()) {
                self.tasks.push(task);
            } else {
                debug!(id = %task.id, "Skipped duplicate import record");
            }
        }
        let added = self.tasks.len() - before;
        if added > 0 {
            self.commit(snapshot)?;
        }
        info!(added, "Imported tasks");
        Ok(added)
    }

    /// Parse an import artifact and apply it with [`Self::import_batch`].
    ///
    /// # Errors
    /// Same as [`Self::import_batch`], plus [`TaskStoreError::Format`] for non-array input.
    pub fn import_bytes(&mut self, bytes: &[u8]) -> Result<usize, TaskStoreError> {
        let records = parse_import(bytes)?;
        self.import_batch(records)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            settings: self.settings,
            editing: self.editing.clone(),
        }
    }

    fn commit(&mut self, snapshot: Snapshot) -> Result<(), PersistenceError> {
        if let Err(err) = self.persistence.save(&self.tasks, &self.settings) {
            warn!(error = %err, "Save failed, restoring previous state");
            self.tasks = snapshot.tasks;
            self.settings = snapshot.settings;
            self.editing = snapshot.editing;
            return Err(err);
        }
        Ok(())
    }
}
