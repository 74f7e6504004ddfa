//! `Edm.Duration` as an ISO 8601 duration (`P1DT2H3M4.5S`).
//!
//! Only day and time components are accepted; years and months have no
//! fixed length. Negative durations cannot be represented by
//! [`std::time::Duration`] and are rejected.

use std::time::Duration;

use ::serde::{Deserialize, Deserializer, Serializer};
use thiserror::Error;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// A string that is not a supported ISO 8601 duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid duration '{text}': {reason}")]
pub struct InvalidDuration {
    pub text: String,
    pub reason: &'static str,
}

/// Formats `duration` in ISO 8601 form.
///
/// ## Examples
///
/// ```
/// use std::time::Duration;
/// use odata_client::serde::duration::format;
///
/// assert_eq!(format(Duration::from_secs(93_784)), "P1DT2H3M4S");
/// assert_eq!(format(Duration::from_millis(1_500)), "PT1.5S");
/// assert_eq!(format(Duration::ZERO), "PT0S");
/// ```
pub fn format(duration: Duration) -> String {
    let total = duration.as_secs();
    let nanos = duration.subsec_nanos();
    let days = total / SECS_PER_DAY;
    let hours = total % SECS_PER_DAY / SECS_PER_HOUR;
    let minutes = total % SECS_PER_HOUR / SECS_PER_MINUTE;
    let seconds = total % SECS_PER_MINUTE;

    let mut out = String::from("P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }

    let has_time = hours > 0 || minutes > 0 || seconds > 0 || nanos > 0;
    if has_time || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || nanos > 0 || (hours == 0 && minutes == 0) {
            out.push_str(&seconds.to_string());
            if nanos > 0 {
                let fraction = format!("{nanos:09}");
                out.push('.');
                out.push_str(fraction.trim_end_matches('0'));
            }
            out.push('S');
        }
    }
    out
}

/// Parses an ISO 8601 duration.
///
/// ## Errors
///
/// Returns [`InvalidDuration`] for negative values, year or month
/// components, malformed numbers and overflow.
pub fn parse(text: &str) -> Result<Duration, InvalidDuration> {
    let invalid = |reason| InvalidDuration {
        text: text.to_string(),
        reason,
    };

    let trimmed = text.trim();
    if trimmed.starts_with('-') {
        return Err(invalid("negative durations are not supported"));
    }
    let body = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .strip_prefix('P')
        .ok_or_else(|| invalid("missing 'P' designator"))?;

    let (date_part, time_part) = match body.split_once('T') {
        Some((_, "")) => return Err(invalid("empty time component")),
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return Err(invalid("no components"));
    }

    let mut secs: u64 = 0;
    let mut nanos: u32 = 0;

    for (number, designator) in components(date_part).map_err(invalid)? {
        let unit = match designator {
            'D' => SECS_PER_DAY,
            'W' => 7 * SECS_PER_DAY,
            'Y' | 'M' => return Err(invalid("years and months have no fixed length")),
            _ => return Err(invalid("unknown date designator")),
        };
        secs = whole(number).and_then(|n| add(secs, n, unit)).map_err(invalid)?;
    }

    for (number, designator) in components(time_part.unwrap_or_default()).map_err(invalid)? {
        let unit = match designator {
            'H' => SECS_PER_HOUR,
            'M' => SECS_PER_MINUTE,
            'S' => 1,
            _ => return Err(invalid("unknown time designator")),
        };
        let (int, fraction) = match designator {
            'S' => number.split_once(['.', ',']).unwrap_or((number, "")),
            _ => (number, ""),
        };
        secs = whole(int).and_then(|n| add(secs, n, unit)).map_err(invalid)?;
        if designator == 'S' {
            nanos = fraction_nanos(fraction).map_err(invalid)?;
        }
    }

    Ok(Duration::new(secs, nanos))
}

/// Splits `"1D2H"` style text into `(number, designator)` pairs.
fn components(text: &str) -> Result<Vec<(&str, char)>, &'static str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            continue;
        }
        let number = &text[start..index];
        if number.is_empty() {
            return Err("designator without a number");
        }
        out.push((number, c));
        start = index + c.len_utf8();
    }
    if start != text.len() {
        return Err("number without a designator");
    }
    Ok(out)
}

fn whole(number: &str) -> Result<u64, &'static str> {
    number.parse().map_err(|_| "expected a whole number")
}

fn fraction_nanos(fraction: &str) -> Result<u32, &'static str> {
    if fraction.is_empty() {
        return Ok(0);
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err("malformed fraction");
    }
    let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
    digits.parse().map_err(|_| "malformed fraction")
}

fn add(total: u64, amount: u64, unit: u64) -> Result<u64, &'static str> {
    amount
        .checked_mul(unit)
        .and_then(|secs| total.checked_add(secs))
        .ok_or("duration overflows")
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(*duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(::serde::de::Error::custom)
}
