use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

const GENERATED_PREFIX: &str = "rec_";

/// Opaque identifier of a task.
///
/// Generated identifiers are `rec_` followed by a UUID v7. Identifiers that
/// arrive through import are kept verbatim, so any non-empty string is valid.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    #[must_use]
    /// Generate a fresh task identifier.
    pub fn new() -> Self {
        // UUID version 7 keeps generated ids roughly ordered by creation time.
        Self(format!("{GENERATED_PREFIX}{}", Uuid::now_v7().simple()))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing an empty identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task id must not be empty")]
pub struct EmptyTaskId;

impl FromStr for TaskId {
    type Err = EmptyTaskId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmptyTaskId);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
