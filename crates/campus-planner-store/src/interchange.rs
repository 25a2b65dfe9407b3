//! JSON export artifacts and import parsing.

use crate::error::{FormatError, PersistenceError};
use campus_planner_core::Task;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::debug;

/// A downloadable file: suggested name plus contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `<prefix>-YYYY-MM-DD.json`.
    pub file_name: String,
    /// Pretty-printed JSON array of tasks.
    pub bytes: Vec<u8>,
}

/// Serialize `tasks` into a dated export artifact.
///
/// # Errors
/// Returns [`PersistenceError`] if the tasks or the date cannot be rendered.
pub fn export_tasks(tasks: &[Task], prefix: &str, now: OffsetDateTime) -> Result<ExportArtifact, PersistenceError> {
    let stamp = now
        .date()
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| PersistenceError::Other(err.to_string()))?;
    let bytes = serde_json::to_vec_pretty(tasks).map_err(|source| PersistenceError::Serialize {
        key: prefix.to_owned(),
        source,
    })?;
    Ok(ExportArtifact {
        file_name: format!("{prefix}-{stamp}.json"),
        bytes,
    })
}

/// Parse an import file into its raw records.
///
/// # Errors
/// Returns [`FormatError`] when the bytes are not JSON or not an array.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<Value>, FormatError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(records) => Ok(records),
        _ => Err(FormatError::NotAnArray),
    }
}

/// Keep the records that carry every required field, decoded as tasks.
///
/// # Errors
/// Returns [`FormatError::NoValidTasks`] when nothing survives.
pub fn importable_tasks(records: Vec<Value>) -> Result<Vec<Task>, FormatError> {
    let total = records.len();
    let tasks: Vec<Task> = records.into_iter().filter_map(accept_record).collect();
    debug!(total, accepted = tasks.len(), "Filtered import records");
    if tasks.is_empty() {
        return Err(FormatError::NoValidTasks);
    }
    Ok(tasks)
}

/// Current field names paired with the legacy spelling they replace.
const ALIASES: [(&str, &str); 5] = [
    ("dueDate", "date"),
    ("duration", "time"),
    ("description", "desc"),
    ("completed", "done"),
    ("createdAt", "created"),
];

fn accept_record(record: Value) -> Option<Task> {
    let Value::Object(mut fields) = record else {
        return None;
    };
    let complete = non_empty_str(&fields, &["id"])
        && non_empty_str(&fields, &["title"])
        && non_empty_str(&fields, &["dueDate", "date"])
        && number(&fields, &["duration", "time"])
        && non_empty_str(&fields, &["tag"]);
    if !complete {
        return None;
    }
    relax_optional(&mut fields);
    serde_json::from_value(Value::Object(fields)).ok()
}

/// Drop or repair optional fields that would not decode, so acceptance
/// depends on the required fields alone.
fn relax_optional(fields: &mut Map<String, Value>) {
    for (current, legacy) in ALIASES {
        if fields.contains_key(current) {
            fields.remove(legacy);
        }
    }
    for flag in ["completed", "done"] {
        if fields.get(flag).is_some_and(|value| !value.is_boolean()) {
            fields.remove(flag);
        }
    }
    for note in ["description", "desc"] {
        if fields.get(note).is_some_and(|value| !value.is_string() && !value.is_null()) {
            fields.remove(note);
        }
    }
    for stamp in ["createdAt", "created", "updatedAt"] {
        let Some(value) = fields.remove(stamp) else {
            continue;
        };
        if let Some(repaired) = value.as_str().and_then(lenient_stamp) {
            fields.insert(stamp.to_owned(), Value::String(repaired));
        }
    }
}

/// RFC 3339 passes through; a bare `YYYY-MM-DD` becomes midnight UTC.
fn lenient_stamp(raw: &str) -> Option<String> {
    if OffsetDateTime::parse(raw, &Rfc3339).is_ok() {
        return Some(raw.to_owned());
    }
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()?;
    date.midnight().assume_utc().format(&Rfc3339).ok()
}

fn lookup<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}

fn non_empty_str(fields: &Map<String, Value>, names: &[&str]) -> bool {
    lookup(fields, names)
        .and_then(Value::as_str)
        .is_some_and(|value| !value.is_empty())
}

fn number(fields: &Map<String, Value>, names: &[&str]) -> bool {
    lookup(fields, names).is_some_and(Value::is_number)
}
