//! Reporting periods and their calendar ranges.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Period {
    Today,
    Last3Days,
    #[default]
    Week,
    Month,
    Year,
}

/// Bucketing unit for a period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Today,
        Period::Last3Days,
        Period::Week,
        Period::Month,
        Period::Year,
    ];

    pub fn granularity(self) -> Granularity {
        match self {
            Period::Today => Granularity::Hour,
            Period::Last3Days | Period::Week | Period::Month => Granularity::Day,
            Period::Year => Granularity::Month,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::Last3Days => "3 days",
            Period::Week => "Week",
            Period::Month => "Month",
            Period::Year => "Year",
        }
    }

    /// Title used above the period's distribution chart
    pub fn chart_title(self) -> &'static str {
        match self {
            Period::Today => "Hours today",
            Period::Last3Days => "Last 3 days",
            Period::Week => "This week",
            Period::Month => "This month",
            Period::Year => "This year",
        }
    }

    /// Resolve this period around `reference` in the time zone `tz`
    pub fn resolve<Tz: TimeZone>(self, reference: NaiveDate, tz: &Tz) -> PeriodRange {
        let (first_day, last_day) = match self {
            Period::Today => (reference, reference),
            Period::Last3Days => (reference - Duration::days(2), reference),
            Period::Week => {
                let monday = week_start(reference);
                (monday, monday + Duration::days(6))
            }
            Period::Month => {
                let first = reference.with_day(1).unwrap_or(reference);
                (first, last_day_of_month(first))
            }
            Period::Year => {
                let first = NaiveDate::from_ymd_opt(reference.year(), 1, 1).unwrap_or(reference);
                let last = NaiveDate::from_ymd_opt(reference.year(), 12, 31).unwrap_or(reference);
                (first, last)
            }
        };

        let start = start_of_day(tz, first_day);
        let end = start_of_day(tz, last_day + Duration::days(1));

        PeriodRange {
            period: self,
            first_day,
            last_day,
            start,
            end,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Concrete `[start, end)` range for a period, plus the local calendar days it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRange {
    pub period: Period,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodRange {
    pub fn granularity(&self) -> Granularity {
        self.period.granularity()
    }

    /// Every local calendar day in the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_day
            .iter_days()
            .take_while(move |d| *d <= self.last_day)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Header text such as "Mar 4 - Mar 10, 2024"
    pub fn describe(&self) -> String {
        if self.first_day == self.last_day {
            self.first_day.format("%a %b %-d, %Y").to_string()
        } else {
            format!("{} - {}", self.first_day.format("%b %-d"), self.last_day.format("%b %-d, %Y"))
        }
    }
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday();
    date - Duration::days(days_from_monday as i64)
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|next| next - Duration::days(1))
        .unwrap_or(first)
}

/// Local midnight of `date` as a UTC instant.
/// Midnights skipped by a DST transition fall back to the first hour that exists.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let local = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest());

    match local {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}
