use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Task, TextMatcher};

/// Ordering applied to the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Latest due date first.
    #[default]
    DateDesc,
    /// Earliest due date first.
    DateAsc,
    /// Title A-Z.
    TitleAsc,
    /// Title Z-A.
    TitleDesc,
    /// Longest first.
    DurationDesc,
    /// Shortest first.
    DurationAsc,
}

impl SortKey {
    /// Every key, in menu order.
    pub const ALL: [Self; 6] = [
        Self::DateDesc,
        Self::DateAsc,
        Self::TitleAsc,
        Self::TitleDesc,
        Self::DurationDesc,
        Self::DurationAsc,
    ];

    /// Wire name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateDesc => "date-desc",
            Self::DateAsc => "date-asc",
            Self::TitleAsc => "title-asc",
            Self::TitleDesc => "title-desc",
            Self::DurationDesc => "duration-desc",
            Self::DurationAsc => "duration-asc",
        }
    }

    /// Look up a key by wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|key| key.as_str().eq_ignore_ascii_case(name))
    }

    /// Look up a key, falling back to [`SortKey::DateDesc`] for unknown or missing names.
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        name.and_then(Self::parse).unwrap_or_default()
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::DateDesc => compare_due(b, a),
            Self::DateAsc => compare_due(a, b),
            Self::TitleAsc => compare_titles(&a.title, &b.title),
            Self::TitleDesc => compare_titles(&b.title, &a.title),
            Self::DurationDesc => b.duration_minutes.total_cmp(&a.duration_minutes),
            Self::DurationAsc => a.duration_minutes.total_cmp(&b.duration_minutes),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orders by calendar date with day overflow rolled forward, then by the
/// written form. Unparseable dates (possible on imported records) order
/// before every valid date.
fn compare_due(a: &Task, b: &Task) -> Ordering {
    a.due_date
        .to_date()
        .cmp(&b.due_date.to_date())
        .then_with(|| a.due_date.parts().cmp(&b.due_date.parts()))
}

/// Case-folded comparison first, raw text only to break ties.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort of borrowed tasks.
pub fn sort_tasks(tasks: &mut [&Task], key: SortKey) {
    tasks.sort_by(|a, b| key.compare(a, b));
}

/// Filter and order tasks without touching the collection.
#[must_use]
pub fn query<'a>(tasks: &'a [Task], filter: &str, key: SortKey) -> Vec<&'a Task> {
    let mut view: Vec<&Task> = match TextMatcher::new(filter) {
        Some(matcher) => tasks.iter().filter(|task| matcher.matches(task)).collect(),
        None => tasks.iter().collect(),
    };
    sort_tasks(&mut view, key);
    view
}
