//! Time and duration parsing for CLI arguments.
//!
//! Supported time formats:
//! - Unix timestamp: `1738944000`
//! - Relative to now: `+30s`, `+5m`, `-1h`, `+2d`
//! - ISO 8601: `2026-02-07T17:00:00`, `2026-02-07T17:00`, RFC 3339 with offset
//! - Time only (current day, UTC): `07:00` or `07:00:30`

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Error type for time parsing failures.
#[derive(Debug, Clone)]
pub struct TimeParseError {
    pub input: String,
    pub message: String,
}

impl TimeParseError {
    fn new(input: &str, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for TimeParseError {}

/// Parses a time string into a Unix timestamp, relative forms counting from now.
pub fn parse_time(input: &str) -> Result<i64, TimeParseError> {
    parse_time_with_base(input, Utc::now().timestamp())
}

/// Parses a time string using `base_ts` as "now".
///
/// | Format | Example | Meaning |
/// |--------|---------|---------|
/// | Unix timestamp | `1738944000` | Seconds since epoch |
/// | Relative | `+30s`, `-1h` | Offset from `base_ts` |
/// | ISO 8601 | `2026-02-07T17:00:00` | UTC unless an offset is given |
/// | Time only | `07:00`, `07:00:30` | That time on the day of `base_ts`, UTC |
pub fn parse_time_with_base(input: &str, base_ts: i64) -> Result<i64, TimeParseError> {
    let input = input.trim();

    if let Some(ts) = try_parse_unix_timestamp(input) {
        return Ok(ts);
    }

    if let Some(delta) = try_parse_relative(input) {
        return base_ts
            .checked_add(delta)
            .ok_or_else(|| TimeParseError::new(input, "relative time overflow"));
    }

    if let Some(ts) = try_parse_iso8601(input) {
        return Ok(ts);
    }

    if let Some(ts) = try_parse_time_only(input, base_ts) {
        return Ok(ts);
    }

    Err(TimeParseError::new(
        input,
        "unrecognized format, use a Unix timestamp (1738944000), relative time \
         (+30s, -5m, +1h), ISO 8601 (2026-02-07T17:00:00), or time of day (07:00)",
    ))
}

/// Parses a duration: plain seconds (`90`) or a number with unit (`90s`, `5m`, `1h`, `1d`).
pub fn parse_duration_secs(input: &str) -> Result<u64, TimeParseError> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(secs);
    }
    split_unit(input)
        .and_then(|(number, unit)| {
            let number = u64::try_from(number).ok()?;
            number.checked_mul(unit_seconds(unit)? as u64)
        })
        .ok_or_else(|| TimeParseError::new(input, "expected seconds or <n>s/m/h/d"))
}

fn unit_seconds(unit: char) -> Option<i64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3600),
        'd' => Some(86400),
        'w' => Some(604800),
        _ => None,
    }
}

/// Splits `<number><unit>` into its parts.
fn split_unit(input: &str) -> Option<(i64, char)> {
    let unit = input.chars().last()?;
    let number_str = &input[..input.len() - unit.len_utf8()];
    if number_str.is_empty() || !number_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((number_str.parse().ok()?, unit))
}

fn try_parse_unix_timestamp(input: &str) -> Option<i64> {
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        input.parse::<i64>().ok()
    } else {
        None
    }
}

/// Returns the signed offset in seconds of `+<n><unit>` / `-<n><unit>`.
fn try_parse_relative(input: &str) -> Option<i64> {
    let (sign, rest) = if let Some(rest) = input.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = input.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };

    let (number, unit) = split_unit(rest)?;
    let seconds = number.checked_mul(unit_seconds(unit)?)?;
    Some(sign * seconds)
}

fn try_parse_iso8601(input: &str) -> Option<i64> {
    if !input.contains('T') {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).timestamp());
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|ndt| Utc.from_utc_datetime(&ndt).timestamp())
}

fn try_parse_time_only(input: &str, base_ts: i64) -> Option<i64> {
    if input.chars().nth(2) != Some(':') {
        return None;
    }

    let time = match input.len() {
        5 => NaiveTime::parse_from_str(input, "%H:%M").ok()?,
        8 => NaiveTime::parse_from_str(input, "%H:%M:%S").ok()?,
        _ => return None,
    };
    let base_date = Utc.timestamp_opt(base_ts, 0).single()?.date_naive();

    Some(Utc.from_utc_datetime(&NaiveDateTime::new(base_date, time)).timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> i64 {
        Utc.with_ymd_and_hms(2026, 2, 8, 10, 0, 0)
            .single()
            .unwrap()
            .timestamp()
    }

    #[test]
    fn test_unix_timestamp() {
        assert_eq!(parse_time("1738944000").unwrap(), 1738944000);
        assert_eq!(parse_time("0").unwrap(), 0);
    }

    #[test]
    fn test_relative_time() {
        let base = base();
        assert_eq!(parse_time_with_base("+30s", base).unwrap(), base + 30);
        assert_eq!(parse_time_with_base("+5m", base).unwrap(), base + 300);
        assert_eq!(parse_time_with_base("-1h", base).unwrap(), base - 3600);
        assert_eq!(parse_time_with_base("+2d", base).unwrap(), base + 172800);
    }

    #[test]
    fn test_relative_time_from_now() {
        let now = Utc::now().timestamp();
        let ts = parse_time("+1m").unwrap();
        assert!((ts - (now + 60)).abs() < 2);
    }

    #[test]
    fn test_iso8601() {
        let expected = Utc
            .with_ymd_and_hms(2026, 2, 7, 17, 0, 0)
            .single()
            .unwrap()
            .timestamp();

        assert_eq!(parse_time("2026-02-07T17:00:00").unwrap(), expected);
        assert_eq!(parse_time("2026-02-07T17:00").unwrap(), expected);
        assert_eq!(parse_time("2026-02-07T19:00:00+02:00").unwrap(), expected);
    }

    #[test]
    fn test_time_only_uses_base_date() {
        let base = base();
        let expected = Utc
            .with_ymd_and_hms(2026, 2, 8, 16, 30, 0)
            .single()
            .unwrap()
            .timestamp();
        assert_eq!(parse_time_with_base("16:30", base).unwrap(), expected);
        assert_eq!(parse_time_with_base("16:30:00", base).unwrap(), expected);
    }

    #[test]
    fn test_invalid_formats() {
        assert!(parse_time("").is_err());
        assert!(parse_time("invalid").is_err());
        assert!(parse_time("2026-02-07").is_err());
        assert!(parse_time("-abc").is_err());
        assert!(parse_time("+5x").is_err());
        assert!(parse_time("12:34:56:78").is_err());
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("90").unwrap(), 90);
        assert_eq!(parse_duration_secs("90s").unwrap(), 90);
        assert_eq!(parse_duration_secs("5m").unwrap(), 300);
        assert_eq!(parse_duration_secs("1h").unwrap(), 3600);
        assert!(parse_duration_secs("-5m").is_err());
        assert!(parse_duration_secs("m").is_err());
        assert!(parse_duration_secs("").is_err());
    }
}
