//! Domain types, validation and derived views for campus-planner tasks.

/// Human-readable rendering of durations and dates.
pub mod format;
/// Identifier types.
pub mod id;
/// Filtering and ordering of task lists.
pub mod query;
/// Aggregate dashboard metrics.
pub mod stats;
/// Free-text and tag matching.
pub mod text_matcher;
/// Field validation rules.
pub mod validate;

use crate::id::TaskId;
use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, Duration, Month, OffsetDateTime};

pub use query::{SortKey, query, sort_tasks};
pub use stats::{Dashboard, DayCount, Progress, ProgressStatus, TOP_TAG_PLACEHOLDER};
pub use text_matcher::TextMatcher;
pub use validate::{
    Field, FieldError, TaskInput, ValidTask, ValidationError, validate, validate_settings, validate_task,
};

/// A single tracked task as stored and exchanged in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier of the task.
    pub id: TaskId,
    /// Human-readable title.
    pub title: String,
    /// Due date in `YYYY-MM-DD` form.
    #[serde(alias = "date")]
    pub due_date: DueDate,
    /// Planned duration in minutes.
    #[serde(rename = "duration", alias = "time")]
    pub duration_minutes: f64,
    /// Single free-form tag.
    pub tag: String,
    /// Optional note (empty when absent).
    #[serde(default, alias = "desc", deserialize_with = "string_or_null")]
    pub description: String,
    /// Completion flag.
    #[serde(default, alias = "done")]
    pub completed: bool,
    /// Creation instant. Imported records may lack it.
    #[serde(
        default,
        alias = "created",
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    /// Instant of the most recent mutation.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl Task {
    /// Build a new, incomplete task from validated fields.
    #[must_use]
    pub fn create(fields: ValidTask, now: OffsetDateTime) -> Self {
        let ValidTask {
            title,
            due_date,
            duration_minutes,
            tag,
            description,
        } = fields;
        Self {
            id: TaskId::new(),
            title,
            due_date,
            duration_minutes,
            tag,
            description,
            completed: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Replace every editable field, keeping identity, creation time and completion.
    pub fn apply_edit(&mut self, fields: ValidTask, now: OffsetDateTime) {
        let ValidTask {
            title,
            due_date,
            duration_minutes,
            tag,
            description,
        } = fields;
        self.title = title;
        self.due_date = due_date;
        self.duration_minutes = duration_minutes;
        self.tag = tag;
        self.description = description;
        self.touch(now);
    }

    /// Flip the completion flag.
    pub fn toggle_completion(&mut self, now: OffsetDateTime) {
        self.completed = !self.completed;
        self.touch(now);
    }

    /// Text searched by free-text queries: title, tag and description.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.tag, self.description)
    }

    fn touch(&mut self, now: OffsetDateTime) {
        self.updated_at = Some(next_stamp(self.updated_at, now));
    }
}

/// Return `now`, or one nanosecond past `previous` when the clock has not advanced.
#[must_use]
pub fn next_stamp(previous: Option<OffsetDateTime>, now: OffsetDateTime) -> OffsetDateTime {
    match previous {
        Some(prev) if now <= prev => prev + Duration::nanoseconds(1),
        _ => now,
    }
}

/// Due date kept exactly as entered (`YYYY-MM-DD`).
///
/// Validation only checks the shape (month 01-12, day 01-31), so values such as
/// `2024-02-31` are representable. Calendar conversion rolls such overflow days
/// into the following month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DueDate(String);

impl DueDate {
    /// Wrap a raw date string without checking it.
    #[must_use]
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(year, month, day)` when the string has the `YYYY-MM-DD` shape.
    #[must_use]
    pub fn parts(&self) -> Option<(i32, u8, u8)> {
        let mut pieces = self.0.trim().splitn(3, '-');
        let year = pieces.next()?;
        let month = pieces.next()?;
        let day = pieces.next()?;
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u8 = month.parse().ok()?;
        let day: u8 = day.parse().ok()?;
        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some((year, month, day))
    }

    /// Convert to a calendar date, rolling day overflow forward (Feb 31 becomes Mar 2 or 3).
    #[must_use]
    pub fn to_date(&self) -> Option<Date> {
        let (year, month, day) = self.parts()?;
        let month = Month::try_from(month).ok()?;
        let first = Date::from_calendar_date(year, month, 1).ok()?;
        first.checked_add(Duration::days(i64::from(day) - 1))
    }

    /// Midnight UTC of the due date.
    #[must_use]
    pub fn to_instant(&self) -> Option<OffsetDateTime> {
        self.to_date().map(|date| date.midnight().assume_utc())
    }
}

impl std::fmt::Display for DueDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Weekly goal configuration. Zero means unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Target minutes per rolling week.
    #[serde(default, alias = "target")]
    pub weekly_target: f64,
    /// Upper bound of minutes per rolling week.
    #[serde(default, alias = "cap")]
    pub weekly_cap: f64,
}

fn string_or_null<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn sample(now: OffsetDateTime) -> Task {
        Task::create(
            ValidTask {
                title: "Read chapter four".into(),
                due_date: DueDate::new_unchecked("2025-03-05"),
                duration_minutes: 45.0,
                tag: "study".into(),
                description: String::new(),
            },
            now,
        )
    }

    #[test]
    fn create_sets_both_timestamps_and_pending_state() {
        let now = datetime!(2025-03-01 10:00 UTC);
        let task = sample(now);
        assert!(!task.completed);
        assert_eq!(task.created_at, Some(now));
        assert_eq!(task.updated_at, Some(now));
    }

    #[test]
    fn edit_keeps_creation_and_completion() {
        let now = datetime!(2025-03-01 10:00 UTC);
        let mut task = sample(now);
        task.toggle_completion(now);
        let created = task.created_at;

        task.apply_edit(
            ValidTask {
                title: "Read chapter five".into(),
                due_date: DueDate::new_unchecked("2025-03-06"),
                duration_minutes: 30.0,
                tag: "study".into(),
                description: "skim".into(),
            },
            now,
        );

        assert_eq!(task.title, "Read chapter five");
        assert!(task.completed);
        assert_eq!(task.created_at, created);
        let updated = task.updated_at.unwrap_or_else(|| panic!("updated stamp"));
        assert!(updated > now);
    }

    #[test]
    fn next_stamp_is_strictly_increasing() {
        let now = datetime!(2025-03-01 10:00 UTC);
        assert_eq!(next_stamp(None, now), now);
        assert_eq!(next_stamp(Some(now), now), now + Duration::nanoseconds(1));
        let later = now + Duration::seconds(1);
        assert_eq!(next_stamp(Some(now), later), later);
    }

    #[test]
    fn due_date_rolls_overflow_days_forward() {
        assert_eq!(DueDate::new_unchecked("2024-02-31").to_date(), Some(date!(2024 - 03 - 02)));
        assert_eq!(DueDate::new_unchecked("2025-04-30").to_date(), Some(date!(2025 - 04 - 30)));
        assert_eq!(DueDate::new_unchecked("tomorrow").to_date(), None);
        assert_eq!(DueDate::new_unchecked("2025-13-01").parts(), None);
    }

    #[test]
    fn deserializes_legacy_field_names() {
        let json = r#"{
            "id": "task_1",
            "title": "Old format",
            "date": "2025-01-02",
            "time": 15,
            "tag": "misc",
            "desc": null,
            "done": true,
            "created": "2025-01-01T08:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap_or_else(|err| panic!("parse: {err}"));
        assert_eq!(task.due_date.as_str(), "2025-01-02");
        assert!((task.duration_minutes - 15.0).abs() < f64::EPSILON);
        assert!(task.description.is_empty());
        assert!(task.completed);
        assert_eq!(task.created_at, Some(datetime!(2025-01-01 08:00 UTC)));
        assert_eq!(task.updated_at, None);
    }

    #[test]
    fn serializes_camel_case_wire_names() {
        let task = sample(datetime!(2025-03-01 10:00 UTC));
        let value = serde_json::to_value(&task).unwrap_or_else(|err| panic!("serialize: {err}"));
        assert_eq!(value["dueDate"], "2025-03-05");
        assert_eq!(value["duration"], 45.0);
        assert_eq!(value["createdAt"], "2025-03-01T10:00:00Z");
        assert_eq!(value["completed"], false);
    }

    #[test]
    fn settings_accept_legacy_names() {
        let settings: Settings =
            serde_json::from_str(r#"{"target": 120, "cap": 300}"#).unwrap_or_else(|err| panic!("parse: {err}"));
        assert!((settings.weekly_target - 120.0).abs() < f64::EPSILON);
        assert!((settings.weekly_cap - 300.0).abs() < f64::EPSILON);
        assert!(Settings::default().weekly_target.abs() < f64::EPSILON);
    }
}
