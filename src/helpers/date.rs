//! Date resolution and display
//!
//! Every `publishedAt` string goes through [`resolve_date`]. Fallback order:
//!
//! 1. RFC 3339 / ISO 8601 with an offset (`2024-01-15T10:30:00.000Z`)
//! 2. Naive date-times, read as UTC (`2024-01-15 10:30:00`, `2024/01/15 10:30`)
//! 3. Bare dates at UTC midnight (`2024-01-15`, `2024/01/15`)
//! 4. Month-name dates with a year (`Jan 15, 2024`, `January 15 2024`)
//! 5. Month-name dates without a year (`Aug 2`): the year of `now`, or the
//!    year before when that lands more than one week after `now`
//!
//! Anything else is unresolved.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MONTH_DAY_YEAR: Regex =
        Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})$").unwrap();
    static ref MONTH_DAY: Regex = Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})$").unwrap();
}

const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolve a date string to an instant
pub fn resolve_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return midnight(d);
        }
    }

    if let Some(caps) = MONTH_DAY_YEAR.captures(s) {
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).and_then(midnight);
    }

    if let Some(caps) = MONTH_DAY.captures(s) {
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let this_year = NaiveDate::from_ymd_opt(now.year(), month, day).and_then(midnight)?;
        if this_year > now + Duration::weeks(1) {
            return NaiveDate::from_ymd_opt(now.year() - 1, month, day).and_then(midnight);
        }
        return Some(this_year);
    }

    None
}

/// Format a date for display: `Today`, `January 5, 2024` for future dates,
/// or `January 5, 2024 (2 months ago)`. Unresolvable input is returned as-is.
pub fn format_date(raw: &str, now: DateTime<Utc>) -> String {
    let Some(date) = resolve_date(raw, now) else {
        return raw.to_string();
    };

    let full = full_date(&date);
    if date.date_naive() == now.date_naive() {
        "Today".to_string()
    } else if date > now {
        full
    } else {
        format!("{} ({})", full, relative_date(&date, now))
    }
}

/// Format date in full format (like "January 1, 2024")
pub fn full_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Get relative time (like "2 hours ago")
pub fn relative_date(date: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(*date);

    if duration.num_seconds() < 0 {
        return "in the future".to_string();
    }

    let seconds = duration.num_seconds();
    let minutes = duration.num_minutes();
    let hours = duration.num_hours();
    let days = duration.num_days();

    if seconds < 45 {
        "a few seconds ago".to_string()
    } else if seconds < 90 {
        "a minute ago".to_string()
    } else if minutes < 45 {
        format!("{} minutes ago", minutes.max(2))
    } else if minutes < 90 {
        "an hour ago".to_string()
    } else if hours < 22 {
        format!("{} hours ago", hours.max(2))
    } else if hours < 36 {
        "a day ago".to_string()
    } else if days < 26 {
        format!("{} days ago", days.max(2))
    } else if days < 46 {
        "a month ago".to_string()
    } else if days < 320 {
        format!("{} months ago", ((days as f64) / 30.4).round().max(2.0) as i64)
    } else if days < 548 {
        "a year ago".to_string()
    } else {
        format!("{} years ago", ((days as f64) / 365.25).round().max(2.0) as i64)
    }
}

fn midnight(d: NaiveDate) -> Option<DateTime<Utc>> {
    d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
}

/// Month number from an English name or an abbreviation of at least three letters
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&name))
        .map(|i| i as u32 + 1)
}
