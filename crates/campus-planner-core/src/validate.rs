use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{DueDate, Settings, Task};

static TITLE_SHAPE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\S(?:[^\r\n\x{2028}\x{2029}]*\S)?$"));
static DUE_DATE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[0-9]{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12][0-9]|3[01])$"));
static MINUTES: LazyLock<Regex> = LazyLock::new(|| compile(r"^(?:0|[1-9][0-9]*)(?:\.[0-9]{1,2})?$"));
static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z]+(?:[ -][A-Za-z]+)*$"));

const MIN_TITLE_CHARS: usize = 3;
const MAX_DURATION_MINUTES: f64 = 1440.0;

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    // Only called with the literal patterns above.
    Regex::new(pattern).expect("built-in validation pattern must compile")
}

/// Input fields subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Task title.
    Title,
    /// Task due date.
    DueDate,
    /// Task duration in minutes.
    Duration,
    /// Task tag.
    Tag,
    /// Weekly target setting.
    WeeklyTarget,
    /// Weekly cap setting.
    WeeklyCap,
}

impl Field {
    /// Label used in user-facing messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::DueDate => "due date",
            Self::Duration => "duration",
            Self::Tag => "tag",
            Self::WeeklyTarget => "weekly target",
            Self::WeeklyCap => "weekly cap",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Check a single raw input value. Returns `None` when the value is acceptable.
#[must_use]
pub fn validate(field: Field, raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Some(format!("{field} is required"));
    }

    match field {
        Field::Title => {
            if !TITLE_SHAPE.is_match(value) {
                return Some("title must be a single line without leading or trailing spaces".into());
            }
            if has_repeated_word(value) {
                return Some("title must not repeat the same word twice in a row".into());
            }
            if value.chars().count() < MIN_TITLE_CHARS {
                return Some(format!("title must be at least {MIN_TITLE_CHARS} characters"));
            }
        }
        Field::DueDate => {
            if !DUE_DATE.is_match(value) {
                return Some("due date must be in YYYY-MM-DD format".into());
            }
        }
        Field::Duration => {
            if !MINUTES.is_match(value) {
                return Some("duration must be a number with at most two decimals".into());
            }
            let minutes: f64 = value.parse().unwrap_or(0.0);
            if minutes <= 0.0 || minutes > MAX_DURATION_MINUTES {
                return Some("duration must be more than 0 and at most 1440 minutes".into());
            }
        }
        Field::Tag => {
            if !TAG.is_match(value) {
                return Some("tag may only contain letters, single spaces and hyphens".into());
            }
        }
        Field::WeeklyTarget | Field::WeeklyCap => {
            if !MINUTES.is_match(value) {
                return Some(format!("{field} must be a number with at most two decimals"));
            }
        }
    }
    None
}

/// True when two ASCII words separated only by whitespace are equal, ignoring case.
fn has_repeated_word(text: &str) -> bool {
    let mut previous: Option<(&str, usize)> = None;
    for (start, word) in ascii_words(text) {
        if let Some((prev, prev_end)) = previous {
            let gap = &text[prev_end..start];
            if !gap.is_empty() && gap.chars().all(char::is_whitespace) && prev.eq_ignore_ascii_case(word) {
                return true;
            }
        }
        previous = Some((word, start + word.len()));
    }
    false
}

fn ascii_words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let bytes = text.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < bytes.len() && !is_word(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        while pos < bytes.len() && is_word(bytes[pos]) {
            pos += 1;
        }
        Some((start, &text[start..pos]))
    })
}

/// Raw form values for creating or editing a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
    /// Title as typed.
    pub title: String,
    /// Due date as typed.
    pub due_date: String,
    /// Duration in minutes as typed.
    pub duration: String,
    /// Tag as typed.
    pub tag: String,
    /// Optional note.
    pub description: Option<String>,
}

impl From<&Task> for TaskInput {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            due_date: task.due_date.as_str().to_owned(),
            duration: task.duration_minutes.to_string(),
            tag: task.tag.clone(),
            description: (!task.description.is_empty()).then(|| task.description.clone()),
        }
    }
}

/// Task fields that passed validation, trimmed and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTask {
    /// Trimmed title.
    pub title: String,
    /// Due date in `YYYY-MM-DD` form.
    pub due_date: DueDate,
    /// Parsed duration.
    pub duration_minutes: f64,
    /// Trimmed tag.
    pub tag: String,
    /// Note, empty when absent.
    pub description: String,
}

/// A rejected field with its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field that failed.
    pub field: Field,
    /// Human-readable reason.
    pub message: String,
}

/// One or more fields failed validation; nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.errors))]
pub struct ValidationError {
    /// Every collected failure, in field order.
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Messages only, in field order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|err| err.message.as_str())
    }

    /// Whether the given field failed.
    #[must_use]
    pub fn has(&self, field: Field) -> bool {
        self.errors.iter().any(|err| err.field == field)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn collect(checks: &[(Field, &str)]) -> Vec<FieldError> {
    checks
        .iter()
        .filter_map(|&(field, raw)| validate(field, raw).map(|message| FieldError { field, message }))
        .collect()
}

/// Validate every task field and aggregate all failures.
///
/// # Errors
/// Returns [`ValidationError`] listing every field that failed.
pub fn validate_task(input: &TaskInput) -> Result<ValidTask, ValidationError> {
    let errors = collect(&[
        (Field::Title, input.title.as_str()),
        (Field::DueDate, input.due_date.as_str()),
        (Field::Duration, input.duration.as_str()),
        (Field::Tag, input.tag.as_str()),
    ]);
    if !errors.is_empty() {
        return Err(ValidationError { errors });
    }

    let duration = input.duration.trim();
    let duration_minutes = duration.parse().map_err(|_| ValidationError {
        errors: vec![FieldError {
            field: Field::Duration,
            message: format!("duration '{duration}' is not a number"),
        }],
    })?;

    Ok(ValidTask {
        title: input.title.trim().to_owned(),
        due_date: DueDate::new_unchecked(input.due_date.trim()),
        duration_minutes,
        tag: input.tag.trim().to_owned(),
        description: input.description.clone().unwrap_or_default(),
    })
}

/// Parse the weekly target and cap. Blank values mean zero (unset).
///
/// # Errors
/// Returns [`ValidationError`] when a non-blank value is not a plain number.
pub fn validate_settings(target: &str, cap: &str) -> Result<Settings, ValidationError> {
    let present: Vec<(Field, &str)> = [(Field::WeeklyTarget, target), (Field::WeeklyCap, cap)]
        .into_iter()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .collect();
    let errors = collect(&present);
    if !errors.is_empty() {
        return Err(ValidationError { errors });
    }

    let parse = |raw: &str| raw.trim().parse::<f64>().unwrap_or(0.0);
    Ok(Settings {
        weekly_target: parse(target),
        weekly_cap: parse(cap),
    })
}
