use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::{Settings, Task};

/// Shown in place of the most frequent tag when there are no tasks.
pub const TOP_TAG_PLACEHOLDER: &str = "--";

/// Number of calendar days covered by the creation trend.
pub const TREND_DAYS: usize = 7;

/// Aggregate metrics shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Number of tasks.
    pub total: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Tasks still open.
    pub pending: usize,
    /// Most frequent tag (first encountered wins ties).
    pub top_tag: Option<String>,
    /// Progress towards the weekly target.
    pub progress: Progress,
    /// Tasks created per day, oldest first, ending today.
    pub trend: Vec<DayCount>,
}

impl Dashboard {
    /// Compute every metric as of `now`.
    #[must_use]
    pub fn compute(tasks: &[Task], settings: &Settings, now: OffsetDateTime) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            total,
            completed,
            pending: total - completed,
            top_tag: top_tag(tasks),
            progress: Progress::compute(tasks, settings, now),
            trend: creation_trend(tasks, now),
        }
    }

    /// The top tag, or [`TOP_TAG_PLACEHOLDER`].
    #[must_use]
    pub fn top_tag_label(&self) -> &str {
        self.top_tag.as_deref().unwrap_or(TOP_TAG_PLACEHOLDER)
    }
}

/// Most frequent tag; on equal counts the tag seen first in the collection wins.
#[must_use]
pub fn top_tag(tasks: &[Task]) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for task in tasks {
        let count = counts.entry(task.tag.as_str()).or_insert(0);
        if *count == 0 {
            order.push(task.tag.as_str());
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for tag in order {
        let count = counts.get(tag).copied().unwrap_or(0);
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((tag, count));
        }
    }
    best.map(|(tag, _)| tag.to_owned())
}

/// Sum of durations for tasks due within `[now - 7 days, now]`.
///
/// A due date counts from midnight UTC, so a task due today is included once the
/// day has started and a task due tomorrow is not.
#[must_use]
pub fn week_minutes(tasks: &[Task], now: OffsetDateTime) -> f64 {
    let week_ago = now - Duration::days(7);
    tasks
        .iter()
        .filter(|task| {
            task.due_date
                .to_instant()
                .is_some_and(|due| due >= week_ago && due <= now)
        })
        .map(|task| task.duration_minutes)
        .sum()
}

/// Weekly progress bar state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// Configured target (0 = unset).
    pub target: f64,
    /// Configured cap (0 = unset).
    pub cap: f64,
    /// Minutes due within the rolling week.
    pub week_minutes: f64,
    /// Bar fill in `[0, 1]`.
    pub fraction: f64,
    /// Status line.
    pub status: ProgressStatus,
}

/// Outcome of comparing the week's minutes with target and cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "minutes", rename_all = "snake_case")]
pub enum ProgressStatus {
    /// No target configured.
    Unset,
    /// Above the cap by this many minutes.
    OverCap(f64),
    /// Target met with this many minutes to spare.
    GoalReached(f64),
    /// This many minutes still needed.
    Remaining(f64),
}

impl Progress {
    /// Evaluate progress for the rolling week ending at `now`.
    #[must_use]
    pub fn compute(tasks: &[Task], settings: &Settings, now: OffsetDateTime) -> Self {
        Self::evaluate(week_minutes(tasks, now), settings)
    }

    /// Evaluate progress for an already summed week.
    #[must_use]
    pub fn evaluate(week: f64, settings: &Settings) -> Self {
        let target = settings.weekly_target;
        let cap = settings.weekly_cap;
        let (fraction, status) = if target > 0.0 {
            let status = if cap > 0.0 && week > cap {
                ProgressStatus::OverCap(week - cap)
            } else if week >= target {
                ProgressStatus::GoalReached(week - target)
            } else {
                ProgressStatus::Remaining(target - week)
            };
            ((week / target).min(1.0), status)
        } else {
            (0.0, ProgressStatus::Unset)
        };
        Self {
            target,
            cap,
            week_minutes: week,
            fraction,
            status,
        }
    }

    /// Bar fill as a whole percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent(self.fraction)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Set a weekly target in settings"),
            Self::OverCap(over) => write!(f, "Over cap by {over} min"),
            Self::GoalReached(extra) => write!(f, "Goal reached! {extra} min extra"),
            Self::Remaining(left) => write!(f, "{left} min left"),
        }
    }
}

/// Creation count for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayCount {
    /// UTC calendar day.
    pub date: Date,
    /// Tasks created on that day.
    pub count: usize,
    /// Bar height relative to the busiest day, in `[0, 1]`.
    pub height: f64,
}

impl DayCount {
    /// Bar height as a whole percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent(self.height)
    }

    /// Short weekday name (`Mon`, `Tue`, ...).
    #[must_use]
    pub fn weekday_label(&self) -> &'static str {
        crate::format::weekday_short(self.date.weekday())
    }
}

/// Tasks created on each of the last seven UTC days, oldest first.
///
/// Heights are normalized against the busiest day, with a denominator of at
/// least one so an empty week yields flat zero bars.
#[must_use]
pub fn creation_trend(tasks: &[Task], now: OffsetDateTime) -> Vec<DayCount> {
    let today = now.to_offset(UtcOffset::UTC).date();
    let days: Vec<(Date, usize)> = (0..TREND_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub(Duration::days(i64::try_from(back).ok()?)))
        .map(|day| {
            let count = tasks
                .iter()
                .filter(|task| {
                    task.created_at
                        .is_some_and(|created| created.to_offset(UtcOffset::UTC).date() == day)
                })
                .count();
            (day, count)
        })
        .collect();

    let max = days.iter().map(|&(_, count)| count).max().unwrap_or(0).max(1);
    days.into_iter()
        .map(|(date, count)| DayCount {
            date,
            count,
            height: ratio(count, max),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn ratio(count: usize, max: usize) -> f64 {
    count as f64 / max as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DueDate;
    use crate::id::TaskId;
    use time::macros::{date, datetime};

    fn task(tag: &str, due: &str, minutes: f64, created: Option<OffsetDateTime>) -> Task {
        Task {
            id: TaskId::new(),
            title: format!("{tag} task"),
            due_date: DueDate::new_unchecked(due),
            duration_minutes: minutes,
            tag: tag.into(),
            description: String::new(),
            completed: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn settings(target: f64, cap: f64) -> Settings {
        Settings {
            weekly_target: target,
            weekly_cap: cap,
        }
    }

    const NOW: OffsetDateTime = datetime!(2025-03-10 15:00 UTC);

    #[test]
    fn counts_and_placeholder_for_empty_collection() {
        let dash = Dashboard::compute(&[], &Settings::default(), NOW);
        assert_eq!(dash.total, 0);
        assert_eq!(dash.pending, 0);
        assert_eq!(dash.top_tag_label(), TOP_TAG_PLACEHOLDER);
        assert_eq!(dash.progress.status, ProgressStatus::Unset);
        assert!(dash.trend.iter().all(|day| day.count == 0 && day.percent() == 0));
    }

    #[test]
    fn completed_and_pending_split() {
        let mut tasks = vec![
            task("a", "2025-03-09", 10.0, None),
            task("a", "2025-03-09", 10.0, None),
            task("b", "2025-03-09", 10.0, None),
        ];
        tasks[1].completed = true;
        let dash = Dashboard::compute(&tasks, &Settings::default(), NOW);
        assert_eq!((dash.total, dash.completed, dash.pending), (3, 1, 2));
    }

    #[test]
    fn top_tag_ties_keep_first_encountered() {
        let tasks = vec![
            task("study", "2025-03-09", 10.0, None),
            task("gym", "2025-03-09", 10.0, None),
            task("gym", "2025-03-09", 10.0, None),
            task("study", "2025-03-09", 10.0, None),
        ];
        assert_eq!(top_tag(&tasks).as_deref(), Some("study"));

        let mut more = tasks.clone();
        more.push(task("gym", "2025-03-09", 10.0, None));
        assert_eq!(top_tag(&more).as_deref(), Some("gym"));
    }

    #[test]
    fn goal_reached_with_extra_minutes() {
        let tasks = vec![
            task("a", "2025-03-04", 30.0, None),
            task("a", "2025-03-08", 45.0, None),
            task("a", "2025-03-10", 20.0, None),
        ];
        let progress = Progress::compute(&tasks, &settings(60.0, 0.0), NOW);
        assert!((progress.week_minutes - 95.0).abs() < f64::EPSILON);
        assert_eq!(progress.status, ProgressStatus::GoalReached(35.0));
        assert!((progress.fraction - 1.0).abs() < f64::EPSILON);
        assert_eq!(progress.status.to_string(), "Goal reached! 35 min extra");
    }

    #[test]
    fn week_window_is_inclusive_and_ignores_future_and_old_dates() {
        let tasks = vec![
            task("a", "2025-03-03", 100.0, None),
            task("a", "2025-03-02", 1.0, None),
            task("a", "2025-03-11", 1.0, None),
            task("a", "not a date", 1.0, None),
        ];
        let exact = datetime!(2025-03-10 00:00 UTC);
        assert!((week_minutes(&tasks, exact) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unset_target_ignores_task_data() {
        let tasks = vec![task("a", "2025-03-09", 500.0, None)];
        let progress = Progress::compute(&tasks, &settings(0.0, 100.0), NOW);
        assert_eq!(progress.status, ProgressStatus::Unset);
        assert_eq!(progress.percent(), 0);
    }

    #[test]
    fn cap_and_remaining_statuses() {
        let over = Progress::evaluate(130.0, &settings(60.0, 120.0));
        assert_eq!(over.status, ProgressStatus::OverCap(10.0));
        assert_eq!(over.status.to_string(), "Over cap by 10 min");

        let left = Progress::evaluate(15.0, &settings(60.0, 120.0));
        assert_eq!(left.status, ProgressStatus::Remaining(45.0));
        assert_eq!(left.percent(), 25);
        assert_eq!(left.status.to_string(), "45 min left");
    }

    #[test]
    fn trend_covers_seven_days_oldest_first() {
        let tasks = vec![
            task("a", "2025-03-09", 10.0, Some(datetime!(2025-03-10 08:00 UTC))),
            task("a", "2025-03-09", 10.0, Some(datetime!(2025-03-10 09:00 UTC))),
            task("a", "2025-03-09", 10.0, Some(datetime!(2025-03-04 23:59 UTC))),
            task("a", "2025-03-09", 10.0, Some(datetime!(2025-03-03 12:00 UTC))),
            task("a", "2025-03-09", 10.0, None),
        ];
        let trend = creation_trend(&tasks, NOW);
        assert_eq!(trend.len(), TREND_DAYS);
        assert_eq!(trend[0].date, date!(2025 - 03 - 04));
        assert_eq!(trend[6].date, date!(2025 - 03 - 10));
        let counts: Vec<usize> = trend.iter().map(|day| day.count).collect();
        assert_eq!(counts, [1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(trend[0].percent(), 50);
        assert_eq!(trend[6].percent(), 100);
        assert_eq!(trend[6].weekday_label(), "Mon");
    }
}
