//! Human-relative timestamp rendering for history views.
//!
//! Thresholds follow the usual git conventions: seconds up to 90 seconds,
//! minutes up to 90 minutes, hours up to 36 hours, days up to two weeks,
//! weeks up to ten weeks, months up to a year, then "N years, M months" up to
//! five years and plain years beyond that.

use chrono::{DateTime, Utc};

const SECOND: i64 = 1;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Render `when` relative to `now`, e.g. `"3 hours ago"`.
pub fn relative_date(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = (now - when).num_seconds();
    if age < 0 {
        return "in the future".to_string();
    }

    if age < 90 * SECOND {
        return ago(rounded(age, SECOND), "second");
    }
    if age < 90 * MINUTE {
        return ago(rounded(age, MINUTE), "minute");
    }
    if age < 36 * HOUR {
        return ago(rounded(age, HOUR), "hour");
    }
    if age < 14 * DAY {
        return ago(rounded(age, DAY), "day");
    }
    if age < 10 * WEEK {
        return ago(rounded(age, WEEK), "week");
    }
    if age < YEAR {
        return ago(rounded(age, MONTH), "month");
    }
    if age < 5 * YEAR {
        let mut years = age / YEAR;
        let mut months = rounded(age % YEAR, MONTH);
        if months >= 12 {
            years += 1;
            months = 0;
        }
        if months == 0 {
            return ago(years, "year");
        }
        return format!("{}, {} ago", unit(years, "year"), unit(months, "month"));
    }
    ago(rounded(age, YEAR), "year")
}

fn rounded(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

fn unit(n: i64, label: &str) -> String {
    if n == 1 {
        format!("{n} {label}")
    } else {
        format!("{n} {label}s")
    }
}

fn ago(n: i64, label: &str) -> String {
    format!("{} ago", unit(n, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn render(age: Duration) -> String {
        let now = Utc::now();
        relative_date(now - age, now)
    }

    #[test]
    fn seconds_minutes_hours() {
        assert_eq!(render(Duration::seconds(1)), "1 second ago");
        assert_eq!(render(Duration::seconds(45)), "45 seconds ago");
        assert_eq!(render(Duration::minutes(5)), "5 minutes ago");
        assert_eq!(render(Duration::hours(3)), "3 hours ago");
    }

    #[test]
    fn days_weeks_months() {
        assert_eq!(render(Duration::days(2)), "2 days ago");
        assert_eq!(render(Duration::days(21)), "3 weeks ago");
        assert_eq!(render(Duration::days(120)), "4 months ago");
    }

    #[test]
    fn years_with_months() {
        assert_eq!(render(Duration::days(365 + 31)), "1 year, 1 month ago");
        assert_eq!(render(Duration::days(2 * 365 + 5)), "2 years ago");
        assert_eq!(render(Duration::days(7 * 365)), "7 years ago");
    }

    #[test]
    fn future_timestamps() {
        let now = Utc::now();
        assert_eq!(relative_date(now + Duration::hours(1), now), "in the future");
    }
}
