//! File import that reads off the calling thread.

use std::fs;
use std::path::PathBuf;

use campus_planner_store::{KeyValueStore, PersistenceError, parse_import};
use tracing::info;

use crate::clock::Clock;
use crate::service::TaskService;
use crate::task_store::TaskStoreError;

/// Read and parse `path` on a blocking task, then apply the batch once.
/// Returns the number of tasks added.
///
/// # Errors
/// Returns [`TaskStoreError::Persistence`] if the file cannot be read,
/// [`TaskStoreError::Format`] if it holds no importable tasks, or any error
/// raised while saving the merged state.
pub async fn import_file<K, C>(service: &mut TaskService<K, C>, path: impl Into<PathBuf>) -> Result<usize, TaskStoreError>
where
    K: KeyValueStore,
    C: Clock,
{
    let path = path.into();
    let shown = path.display().to_string();
    let records = tokio::task::spawn_blocking(move || -> Result<_, TaskStoreError> {
        let bytes = fs::read(&path).map_err(PersistenceError::from)?;
        Ok(parse_import(&bytes)?)
    })
    .await
    .map_err(|e| PersistenceError::Other(format!("Task join error: {e}")))??;

    let added = service.store_mut().import_batch(records)?;
    info!(path = %shown, added, "Imported file");
    Ok(added)
}
