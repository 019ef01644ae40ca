use chrono::{DateTime, Local, TimeZone, Utc};

use crate::constants::{DAY_HEADER_PATTERN, DEFAULT_TIMESTAMP_PATTERN};

/// Render epoch milliseconds in local time, e.g. `2024.03.01 09:30`.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    format_timestamp_with(timestamp_ms, DEFAULT_TIMESTAMP_PATTERN)
}

pub fn format_timestamp_with(timestamp_ms: i64, pattern: &str) -> String {
    format_timestamp_in(timestamp_ms, &Local, pattern)
}

/// Out-of-range timestamps render as an empty string.
pub fn format_timestamp_in<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz, pattern: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(utc) => utc.with_timezone(tz).format(pattern).to_string(),
        None => String::new(),
    }
}

/// Date header text for the first item of each day in a thread.
pub fn format_day_header(timestamp_ms: i64) -> String {
    format_timestamp_with(timestamp_ms, DAY_HEADER_PATTERN)
}

/// Whether two timestamps fall on the same local calendar day.
pub fn is_same_day(first_ms: i64, second_ms: i64) -> bool {
    is_same_day_in(first_ms, second_ms, &Local)
}

/// Out-of-range timestamps never share a day with anything.
pub fn is_same_day_in<Tz: TimeZone>(first_ms: i64, second_ms: i64, tz: &Tz) -> bool {
    let day = |ms: i64| {
        DateTime::<Utc>::from_timestamp_millis(ms).map(|utc| utc.with_timezone(tz).date_naive())
    };
    match (day(first_ms), day(second_ms)) {
        (Some(first), Some(second)) => first == second,
        _ => false,
    }
}
