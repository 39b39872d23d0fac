//! Text helpers shared by the wire decoder and the report navigator.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

/// `dd/mm/yyyy` optionally followed by `HH:MM`.
static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}/\d{2}/\d{4})(?:\s+(\d{2}:\d{2}))?").expect("valid date regex")
});

/// Returns the substring between the first `start` marker and the next `end`
/// marker after it.
///
/// Returns `None` when `start` is absent. When `end` never follows, the rest
/// of the haystack is returned.
#[must_use]
pub fn between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let rest = &haystack[from..];
    match rest.find(end) {
        Some(to) => Some(&rest[..to]),
        None => Some(rest),
    }
}

/// Keeps only the ASCII digits of `s`.
#[must_use]
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Finds the first `dd/mm/yyyy` date in `s`, ignoring any surrounding markup.
#[must_use]
pub fn find_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_TIME.captures(s)?;
    NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%d/%m/%Y").ok()
}

/// Finds the first `dd/mm/yyyy[ HH:MM]` timestamp in `s`.
///
/// A date without a time is taken at midnight.
#[must_use]
pub fn find_datetime(s: &str) -> Option<NaiveDateTime> {
    let caps = DATE_TIME.captures(s)?;
    let date = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%d/%m/%Y").ok()?;
    let time = match caps.get(2) {
        Some(t) => NaiveTime::parse_from_str(t.as_str(), "%H:%M").ok()?,
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

/// Collapses runs of whitespace (including non-breaking spaces) into single
/// spaces and trims the result.
#[must_use]
pub fn squash_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
