use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::time::{parse_instant, parse_iso_duration};
use crate::config::TimeFormat;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API key not configured")]
    MissingApiKey,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API request failed: {status} - {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Connection-level failures, as opposed to the API rejecting the request
    pub fn is_offline(&self) -> bool {
        match self {
            ApiError::Network(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        match self {
            ApiError::MissingApiKey => true,
            ApiError::Status { status, .. } => {
                *status == reqwest::StatusCode::UNAUTHORIZED || *status == reqwest::StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimeEntry {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub time_interval: RawTimeInterval,
}

// Running timers come back with `end` and `duration` set to null
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTimeInterval {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl RawTimeEntry {
    /// Convert to a domain entry. `now` closes intervals of timers still running.
    /// Returns None when the start instant is missing or unparseable, or the
    /// interval cannot be represented.
    pub fn into_entry(self, now: DateTime<Utc>) -> Option<TimeEntry> {
        let start = self.time_interval.start.as_deref().and_then(parse_instant)?;
        let end = self.time_interval.end.as_deref().and_then(parse_instant);

        let duration_seconds = self
            .time_interval
            .duration
            .as_deref()
            .and_then(parse_iso_duration)
            .or_else(|| end.map(|e| (e - start).num_seconds()))
            .unwrap_or_else(|| (now - start).num_seconds())
            .max(0);

        let end = match end {
            Some(end) => end,
            None => chrono::TimeDelta::try_seconds(duration_seconds)
                .and_then(|d| start.checked_add_signed(d))?,
        };

        Some(TimeEntry {
            id: self.id,
            project_id: self.project_id.filter(|p| !p.is_empty()),
            description: self.description.unwrap_or_default(),
            interval: Interval {
                start,
                end,
                duration_seconds,
            },
        })
    }
}

/// Convert a page of wire entries, dropping malformed ones.
/// Returns the entries and how many were skipped.
pub fn convert_entries(raw: Vec<RawTimeEntry>, now: DateTime<Utc>) -> (Vec<TimeEntry>, usize) {
    let total = raw.len();
    let mut entries = Vec::with_capacity(total);

    for item in raw {
        let id = item.id.clone();
        match item.into_entry(now) {
            Some(entry) => entries.push(entry),
            None => log::warn!("Skipping malformed time entry {}", id),
        }
    }

    let skipped = total - entries.len();
    (entries, skipped)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
}

// Time entry as the dashboard sees it
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub id: String,
    pub project_id: Option<String>,
    pub description: String,
    pub interval: Interval,
}

impl TimeEntry {
    pub fn hours(&self) -> f64 {
        self.interval.duration_seconds as f64 / 3600.0
    }

    pub fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.interval.start.with_timezone(tz).date_naive()
    }
}

/// Format seconds as "Xh Ym" string
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;

    if hours > 0 && mins > 0 {
        format!("{}h {}m", hours, mins)
    } else if hours > 0 {
        format!("{}h", hours)
    } else if mins > 0 {
        format!("{}m", mins)
    } else if seconds > 0 {
        "<1m".to_string()
    } else {
        "0m".to_string()
    }
}

/// Format fractional hours as "3.25h", trimming trailing zeros
pub fn format_decimal_hours(hours: f64) -> String {
    if hours == 0.0 {
        "0h".to_string()
    } else if hours == hours.floor() {
        format!("{}h", hours as i64)
    } else {
        let s = format!("{:.2}", hours);
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        format!("{}h", trimmed)
    }
}

/// Format seconds based on user's preferred time format
pub fn format_duration_with_format(seconds: i64, time_format: TimeFormat) -> String {
    match time_format {
        TimeFormat::HoursMinutes => format_duration(seconds),
        TimeFormat::Decimal => format_decimal_hours(seconds as f64 / 3600.0),
    }
}

/// Format fractional hours based on user's preferred time format
pub fn format_hours_with_format(hours: f64, time_format: TimeFormat) -> String {
    format_duration_with_format((hours * 3600.0).round() as i64, time_format)
}
