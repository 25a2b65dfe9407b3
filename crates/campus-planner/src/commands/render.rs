use std::fmt::Write as _;

use campus_planner_core::format::{format_due_date, format_duration};
use campus_planner_core::{Dashboard, Settings, Task};

const BAR_WIDTH: usize = 20;

pub fn task_table(tasks: &[&Task]) -> String {
    let mut out = String::new();
    out.push_str("ID | Done | Due | Title | Tag | Duration\n");
    out.push_str("-- | ---- | --- | ----- | --- | --------\n");
    for task in tasks {
        let done = if task.completed { "x" } else { " " };
        let _ = writeln!(
            out,
            "{} | [{done}] | {} | {} | {} | {}",
            task.id,
            format_due_date(&task.due_date),
            task.title,
            task.tag,
            format_duration(task.duration_minutes)
        );
        let note = task.description.trim();
        if !note.is_empty() {
            let _ = writeln!(out, "    Note: {note}");
        }
    }
    out
}

pub fn dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total: {}  Completed: {}  Pending: {}",
        dashboard.total, dashboard.completed, dashboard.pending
    );
    let _ = writeln!(out, "Top tag: {}", dashboard.top_tag_label());

    let progress = &dashboard.progress;
    let _ = writeln!(
        out,
        "This week: {} [{}] {}%",
        format_duration(progress.week_minutes),
        bar(progress.percent()),
        progress.percent()
    );
    let _ = writeln!(out, "{}", progress.status);

    out.push_str("Created in the last 7 days:\n");
    for day in &dashboard.trend {
        let _ = writeln!(
            out,
            "{} {} [{}] {}",
            day.weekday_label(),
            day.date,
            bar(day.percent()),
            day.count
        );
    }
    out
}

pub fn settings(settings: &Settings) -> String {
    format!(
        "Weekly target: {}\nWeekly cap: {}\n",
        minutes_or_unset(settings.weekly_target),
        minutes_or_unset(settings.weekly_cap)
    )
}

fn minutes_or_unset(minutes: f64) -> String {
    if minutes > 0.0 {
        format_duration(minutes)
    } else {
        "not set".into()
    }
}

fn bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
