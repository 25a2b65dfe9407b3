use time::{Month, Weekday};

use crate::DueDate;

/// `45 min`, `1h 30m`, `2h`.
#[must_use]
pub fn format_duration(minutes: f64) -> String {
    if minutes < 60.0 {
        return format!("{minutes} min");
    }
    let hours = (minutes / 60.0).floor();
    let rest = minutes % 60.0;
    if rest.abs() < f64::EPSILON {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}

/// `Mar 5, 2025`; the raw value when it is not a date.
#[must_use]
pub fn format_due_date(due: &DueDate) -> String {
    due.to_date().map_or_else(
        || due.as_str().to_owned(),
        |date| format!("{} {}, {}", month_short(date.month()), date.day(), date.year()),
    )
}

/// `90 min = 1.50 hrs`, or `None` for zero, negative or non-finite input.
#[must_use]
pub fn minutes_to_hours(minutes: f64) -> Option<String> {
    (minutes.is_finite() && minutes > 0.0).then(|| format!("{minutes} min = {:.2} hrs", minutes / 60.0))
}

/// Three-letter weekday name.
#[must_use]
pub const fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

const fn month_short(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(45.0), "45 min");
        assert_eq!(format_duration(12.5), "12.5 min");
        assert_eq!(format_duration(60.0), "1h");
        assert_eq!(format_duration(90.0), "1h 30m");
        assert_eq!(format_duration(1440.0), "24h");
    }

    #[test]
    fn due_dates() {
        assert_eq!(format_due_date(&DueDate::new_unchecked("2025-03-05")), "Mar 5, 2025");
        assert_eq!(format_due_date(&DueDate::new_unchecked("soon")), "soon");
    }

    #[test]
    fn hours_conversion() {
        assert_eq!(minutes_to_hours(90.0).as_deref(), Some("90 min = 1.50 hrs"));
        assert_eq!(minutes_to_hours(20.0).as_deref(), Some("20 min = 0.33 hrs"));
        assert_eq!(minutes_to_hours(0.0), None);
    }
}
