//! Parsing helpers for the timestamps and durations Clockify returns

use chrono::{DateTime, SecondsFormat, Utc};

/// Parse an RFC 3339 instant such as "2024-03-06T09:15:00Z"
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format an instant the way the time-entries query expects it
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Longest duration a single entry may claim: ten years
pub const MAX_DURATION_SECONDS: i64 = 10 * 366 * 86_400;

/// Parse an ISO-8601 duration like "PT1H30M", "PT45S" or "P1DT2H" into whole seconds.
/// Years and months are rejected since their length is ambiguous, and so is
/// anything longer than `MAX_DURATION_SECONDS`.
pub fn parse_iso_duration(value: &str) -> Option<i64> {
    let value = value.trim();
    let rest = value.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let mut total = 0.0_f64;
    let mut in_time = false;
    let mut number = String::new();
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            'T' => {
                if in_time || !number.is_empty() {
                    return None;
                }
                in_time = true;
            }
            '0'..='9' | '.' | ',' => number.push(if c == ',' { '.' } else { c }),
            unit => {
                let amount: f64 = number.parse().ok()?;
                number.clear();
                let seconds = match (in_time, unit) {
                    (false, 'W') => 7.0 * 86_400.0,
                    (false, 'D') => 86_400.0,
                    (true, 'H') => 3_600.0,
                    (true, 'M') => 60.0,
                    (true, 'S') => 1.0,
                    _ => return None,
                };
                total += amount * seconds;
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return None;
    }
    if !total.is_finite() || total > MAX_DURATION_SECONDS as f64 {
        return None;
    }

    Some(total.round() as i64)
}
