//! Timestamp normalization
//!
//! Converts the time inputs operators type on the command line or in config
//! files into the compact `YYYYMMDDHHmm` UTC form that the compliance endpoint
//! and the checkpoint file use.
//!
//! Accepted inputs, tested in this order:
//!
//! | input | meaning |
//! |---|---|
//! | `90m`, `1.5h`, `2d` (case-insensitive suffix) | that long before `now` |
//! | `201311151546` | already canonical |
//! | `2013-11-15 15:46` | separators stripped |
//! | `2013-11-15T15:46:42.000Z`, `2013-11-15T16:46+0100` | full timestamp, converted to UTC |

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};

/// `chrono` format string of the canonical form
pub const CANONICAL_FORMAT: &str = "%Y%m%d%H%M";

/// Length of a canonical timestamp
pub const CANONICAL_LEN: usize = 12;

/// Length of the `YYYY-MM-DD HH:MM` form
const SHORT_DATETIME_LEN: usize = 16;

/// Zone-less layouts accepted for long inputs (taken as UTC)
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Layouts with a numeric offset, `+0000` or `+00:00`
const ZONED_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
    "%Y-%m-%d %H:%M %z",
];

/// Timestamp errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// The input matched none of the accepted grammars
    #[error("unparseable timestamp {input:?}: {reason}")]
    UnparseableTimestamp {
        /// Offending input
        input: String,
        /// What was wrong with it
        reason: String,
    },
}

fn unparseable(input: &str, reason: impl Into<String>) -> TimestampError {
    TimestampError::UnparseableTimestamp {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Normalize `input` to the canonical `YYYYMMDDHHmm` form.
///
/// Relative offsets are computed against `now`, never against the wall clock,
/// and truncated to the minute.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use compliance_poller::timestamp::normalize;
///
/// let now = Utc.with_ymd_and_hms(2013, 11, 15, 17, 16, 0).unwrap();
/// assert_eq!(normalize("90m", now).unwrap(), "201311151546");
/// assert_eq!(normalize("2013-11-15 17:16", now).unwrap(), "201311151716");
/// ```
pub fn normalize(input: &str, now: DateTime<Utc>) -> Result<String, TimestampError> {
    let input = input.trim();

    if let Some(offset) = relative_offset(input)? {
        let date = now
            .checked_sub_signed(offset)
            .ok_or_else(|| unparseable(input, "offset out of range"))?;
        return Ok(format_canonical(date));
    }

    let len = input.chars().count();

    if len == CANONICAL_LEN && is_all_digits(input) {
        return Ok(input.to_string());
    }

    if len == SHORT_DATETIME_LEN {
        let stripped: String = input.chars().filter(|c| c.is_alphanumeric()).collect();
        if stripped.len() == CANONICAL_LEN && is_all_digits(&stripped) {
            return Ok(stripped);
        }
        return Err(unparseable(input, "expected YYYY-MM-DD HH:MM"));
    }

    if len > SHORT_DATETIME_LEN {
        return parse_full(input)
            .map(format_canonical)
            .ok_or_else(|| unparseable(input, "not a recognized date-time"));
    }

    Err(unparseable(
        input,
        "expected YYYYMMDDHHMM, \"YYYY-MM-DD HH:MM\", an ISO-8601 timestamp or ##m/##h/##d",
    ))
}

/// Normalize `input` and parse the result into a UTC instant.
pub fn resolve(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimestampError> {
    parse_canonical(&normalize(input, now)?)
}

/// Render `date` in canonical form (seconds are dropped).
pub fn format_canonical(date: DateTime<Utc>) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// Parse a canonical `YYYYMMDDHHmm` string, validating every calendar field.
pub fn parse_canonical(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    if value.len() != CANONICAL_LEN || !is_all_digits(value) {
        return Err(unparseable(value, "expected 12 digits YYYYMMDDHHMM"));
    }

    // All bytes are ASCII digits, so slicing and parsing cannot fail.
    let field = |range: std::ops::Range<usize>| value[range].parse::<u32>().unwrap_or_default();
    let year = field(0..4) as i32;
    let (month, day, hour, minute) = (field(4..6), field(6..8), field(8..10), field(10..12));

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| unparseable(value, "calendar fields out of range"))
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(date: DateTime<Utc>) -> DateTime<Utc> {
    date.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(date)
}

/// Whether `value` is already in canonical form.
pub fn is_canonical(value: &str) -> bool {
    parse_canonical(value).is_ok()
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Parse `<number><m|h|d>`. Returns `Ok(None)` when the suffix does not match.
fn relative_offset(input: &str) -> Result<Option<TimeDelta>, TimestampError> {
    let Some(suffix) = input.chars().last() else {
        return Ok(None);
    };

    let unit_secs: f64 = match suffix.to_ascii_lowercase() {
        'm' => 60.0,
        'h' => 3_600.0,
        'd' => 86_400.0,
        _ => return Ok(None),
    };

    let prefix = &input[..input.len() - suffix.len_utf8()];
    let amount: f64 = prefix
        .trim()
        .parse()
        .map_err(|_| unparseable(input, "offset prefix is not a number"))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(unparseable(input, "offset must be a non-negative number"));
    }

    let millis = (amount * unit_secs * 1_000.0).round();
    if millis >= i64::MAX as f64 {
        return Err(unparseable(input, "offset out of range"));
    }

    TimeDelta::try_milliseconds(millis as i64)
        .map(Some)
        .ok_or_else(|| unparseable(input, "offset out of range"))
}

/// Parse a full timestamp (date, time, optional fraction, optional zone).
fn parse_full(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    // A trailing `Z` marks UTC, which is what zone-less input means anyway
    let input = input
        .strip_suffix('Z')
        .or_else(|| input.strip_suffix('z'))
        .unwrap_or(input);

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
}
