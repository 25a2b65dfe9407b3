//! Application layer for campus-planner.
//!
//! This crate owns the task store, configuration loading and the file import
//! workflow shared by the command-line front end.

pub mod async_import;
pub mod clock;
pub mod config;
pub mod service;
pub mod task_store;

// Re-exports for convenience
pub use async_import::import_file;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DisplayConfig, ExportConfig, ProjectConfig, StorageConfig};
pub use service::TaskService;
pub use task_store::{TaskStore, TaskStoreError};
