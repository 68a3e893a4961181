//! Parsing and formatting of retention durations and build timestamps.
//!
//! Both parsers walk an ordered list of grammars and stop at the first one that
//! accepts the input, so adding a format means appending one function.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::error::{BuildToolError, Result};

static UNIT_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)([smhdw])$").expect("valid unit duration pattern"));

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^([-+]?)P(?:([-+]?\d+)D)?(T(?:([-+]?\d+)H)?(?:([-+]?\d+)M)?(?:([-+]?\d+)(?:[.,](\d{0,9}))?S)?)?$",
    )
    .expect("valid ISO-8601 duration pattern")
});

type DurationParser = fn(&str) -> Option<Duration>;
type InstantParser = fn(&str) -> Option<DateTime<Utc>>;

const DURATION_PARSERS: [DurationParser; 2] = [parse_unit_duration, parse_iso_duration];

const INSTANT_PARSERS: [InstantParser; 3] =
    [parse_utc_instant, parse_offset_date_time, parse_local_date_time];

/// Relative-age units, largest first. Months and years are fixed-length.
const RELATIVE_UNITS: [(&str, i64); 7] = [
    ("year", 365 * 86_400),
    ("month", 30 * 86_400),
    ("week", 7 * 86_400),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// Parses a retention expression such as `30d`, `12H`, `2w` or `PT2H30M`.
///
/// # Errors
///
/// Returns a configuration error when the input is blank or matches none of
/// the accepted grammars.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BuildToolError::config("Duration value must not be blank"));
    }

    DURATION_PARSERS
        .iter()
        .find_map(|parse| parse(trimmed))
        .ok_or_else(|| BuildToolError::config(format!("Unsupported duration format: {text}")))
}

fn parse_unit_duration(text: &str) -> Option<Duration> {
    let caps = UNIT_DURATION.captures(text)?;
    let amount: i64 = caps[1].parse().ok()?;
    match caps[2].to_ascii_lowercase().as_str() {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        "w" => Duration::try_days(amount.checked_mul(7)?),
        _ => None,
    }
}

fn parse_iso_duration(text: &str) -> Option<Duration> {
    let caps = ISO_DURATION.captures(text)?;

    let days = caps.get(2);
    let time = caps.get(3);
    let (hours, minutes, seconds) = (caps.get(4), caps.get(5), caps.get(6));

    // "P" and "PT" alone carry no amount.
    if time.is_some_and(|t| t.as_str().len() == 1) {
        return None;
    }
    if days.is_none() && hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }

    let number = |m: Option<regex::Match<'_>>| -> Option<i64> {
        m.map_or(Some(0), |m| m.as_str().parse::<i64>().ok())
    };

    let mut total = Duration::try_days(number(days)?)?;
    total = total.checked_add(&Duration::try_hours(number(hours)?)?)?;
    total = total.checked_add(&Duration::try_minutes(number(minutes)?)?)?;

    let whole_seconds = number(seconds)?;
    total = total.checked_add(&Duration::try_seconds(whole_seconds)?)?;

    if let Some(fraction) = caps.get(7).filter(|f| !f.as_str().is_empty()) {
        let digits = format!("{:0<9}", fraction.as_str());
        let nanos: i64 = digits.parse().ok()?;
        let negative = seconds.is_some_and(|s| s.as_str().starts_with('-'));
        let nanos = if negative { -nanos } else { nanos };
        total = total.checked_add(&Duration::nanoseconds(nanos))?;
    }

    if &caps[1] == "-" {
        total = -total;
    }

    Some(total)
}

/// Parses a timestamp reported by the build API.
///
/// Accepts, in order: a UTC instant (`2024-05-01T10:00:00Z`), an
/// offset-qualified date-time (`2024-05-01T12:00:00+02:00`) and a local
/// date-time (`2024-05-01T10:00:00`, read in the system time zone).
/// Anything else yields `None`; an unreadable timestamp means "unknown".
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    INSTANT_PARSERS.iter().find_map(|parse| parse(trimmed))
}

fn parse_utc_instant(text: &str) -> Option<DateTime<Utc>> {
    if !text.ends_with(['Z', 'z']) {
        return None;
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(&text[..text.len() - 1], "%Y-%m-%dT%H:%M")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn parse_offset_date_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%:z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn parse_local_date_time(text: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .ok()?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Renders an instant as `yyyy-MM-dd HH:mm:ss <zone>` in local time.
pub fn format_instant(instant: Option<DateTime<Utc>>) -> String {
    match instant {
        Some(instant) => instant
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string(),
        None => "n/a".to_string(),
    }
}

/// Renders how long ago `instant` was, e.g. `3 months ago`.
pub fn format_relative(instant: Option<DateTime<Utc>>) -> String {
    format_relative_at(instant, Utc::now())
}

pub fn format_relative_at(instant: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(instant) = instant else {
        return "unknown".to_string();
    };

    let elapsed = (now - instant).num_seconds();
    if elapsed <= 0 {
        return "just now".to_string();
    }

    RELATIVE_UNITS
        .iter()
        .find_map(|(name, unit_seconds)| {
            let units = elapsed / unit_seconds;
            (units > 0).then(|| format!("{units} {} ago", pluralize(name, units)))
        })
        .unwrap_or_else(|| "just now".to_string())
}

pub fn pluralize(word: &str, count: i64) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
