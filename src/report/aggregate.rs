//! Bucketing of time entries into per-hour, per-day and per-month totals.
//!
//! Every bucket holds unrounded hours; rounding only happens when a value is
//! displayed, so sums over many entries do not drift.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use std::collections::{BTreeMap, HashMap};

use super::period::{Granularity, Period, PeriodRange};
use super::projects::ProjectDirectory;
use crate::api::TimeEntry;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub hours: f64,
}

impl Bucket {
    fn new(label: impl Into<String>, hours: f64) -> Self {
        Self {
            label: label.into(),
            hours,
        }
    }

    /// Hours rounded to two decimals
    pub fn display_hours(&self) -> f64 {
        (self.hours * 100.0).round() / 100.0
    }
}

/// Which calendar days get a bucket for day-granularity periods other than `Week`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayFill {
    /// Every day of the range, zero when nothing was tracked
    #[default]
    Calendar,
    /// Only days with at least one entry
    Observed,
}

impl DayFill {
    pub fn from_config(fill_empty_days: bool) -> Self {
        if fill_empty_days {
            DayFill::Calendar
        } else {
            DayFill::Observed
        }
    }
}

/// Bucket `entries` according to the granularity of `range.period`.
/// Entries are placed by their start instant viewed in `tz`.
pub fn aggregate<Tz: TimeZone>(
    entries: &[TimeEntry],
    range: &PeriodRange,
    tz: &Tz,
    fill: DayFill,
) -> Vec<Bucket> {
    match range.granularity() {
        Granularity::Hour => by_hour(entries, tz),
        Granularity::Day if range.period == Period::Week => by_weekday(entries, tz),
        Granularity::Day => by_day(entries, range, tz, fill),
        Granularity::Month => by_month(entries, tz),
    }
}

/// Splits along local wall-clock time, so on a DST fall-back day the repeated
/// hour's fragments land in the wall-clock slot. Totals are unaffected.
fn by_hour<Tz: TimeZone>(entries: &[TimeEntry], tz: &Tz) -> Vec<Bucket> {
    let mut slots = [0.0_f64; 24];

    for entry in entries {
        let seconds = entry.interval.duration_seconds.max(0);
        let start = entry.interval.start.with_timezone(tz).naive_local();
        let Some(end) = Duration::try_seconds(seconds).and_then(|d| start.checked_add_signed(d)) else {
            log::warn!("Skipping time entry {} with an out-of-range duration", entry.id);
            continue;
        };

        if seconds < 3600 || floor_hour(start) == floor_hour(end) {
            slots[start.hour() as usize] += entry.hours();
            continue;
        }

        let mut position = start;
        while position < end {
            let step_end = floor_hour(position)
                .checked_add_signed(Duration::hours(1))
                .map_or(end, |boundary| boundary.min(end));
            slots[position.hour() as usize] += hours_between(position, step_end);
            position = step_end;
        }
    }

    slots
        .iter()
        .enumerate()
        .map(|(hour, hours)| Bucket::new(format!("{:02}:00", hour), *hours))
        .collect()
}

fn by_weekday<Tz: TimeZone>(entries: &[TimeEntry], tz: &Tz) -> Vec<Bucket> {
    let mut slots = [0.0_f64; 7];
    for entry in entries {
        let weekday = entry.local_date(tz).weekday();
        slots[weekday.num_days_from_monday() as usize] += entry.hours();
    }

    WEEKDAY_LABELS
        .iter()
        .zip(slots)
        .map(|(label, hours)| Bucket::new(*label, hours))
        .collect()
}

fn by_day<Tz: TimeZone>(entries: &[TimeEntry], range: &PeriodRange, tz: &Tz, fill: DayFill) -> Vec<Bucket> {
    // Keyed by date so day buckets stay chronological across month and year ends
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    if fill == DayFill::Calendar {
        for day in range.days() {
            days.insert(day, 0.0);
        }
    }

    for entry in entries {
        *days.entry(entry.local_date(tz)).or_insert(0.0) += entry.hours();
    }

    days.into_iter()
        .map(|(day, hours)| Bucket::new(day.format("%d/%m").to_string(), hours))
        .collect()
}

fn by_month<Tz: TimeZone>(entries: &[TimeEntry], tz: &Tz) -> Vec<Bucket> {
    let mut slots = [0.0_f64; 12];
    for entry in entries {
        slots[entry.local_date(tz).month0() as usize] += entry.hours();
    }

    MONTH_LABELS
        .iter()
        .zip(slots)
        .map(|(label, hours)| Bucket::new(*label, hours))
        .collect()
}

/// Hours per project name, largest first. Unknown projects share the sentinel label.
pub fn aggregate_by_project(entries: &[TimeEntry], directory: &ProjectDirectory) -> Vec<Bucket> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for entry in entries {
        let name = directory.resolve(entry.project_id.as_deref());
        *totals.entry(name).or_insert(0.0) += entry.hours();
    }

    let mut buckets: Vec<Bucket> = totals
        .into_iter()
        .map(|(name, hours)| Bucket::new(name, hours))
        .collect();
    buckets.sort_by(|a, b| b.hours.total_cmp(&a.hours).then_with(|| a.label.cmp(&b.label)));
    buckets
}

pub fn total_hours(entries: &[TimeEntry]) -> f64 {
    entries.iter().map(TimeEntry::hours).sum()
}

fn floor_hour(dt: NaiveDateTime) -> NaiveDateTime {
    dt - Duration::seconds((dt.minute() * 60 + dt.second()) as i64)
        - Duration::nanoseconds(dt.nanosecond() as i64)
}

fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Interval, Project};
    use crate::report::projects::UNASSIGNED_LABEL;
    use chrono::{DateTime, FixedOffset, Utc};

    const EPSILON: f64 = 1e-9;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry_at(start: DateTime<Utc>, minutes: i64, project: Option<&str>) -> TimeEntry {
        let seconds = minutes * 60;
        TimeEntry {
            id: format!("{}-{}", start.timestamp(), minutes),
            project_id: project.map(String::from),
            description: String::new(),
            interval: Interval {
                start,
                end: start + Duration::seconds(seconds),
                duration_seconds: seconds,
            },
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn hours_of(buckets: &[Bucket], label: &str) -> f64 {
        buckets.iter().find(|b| b.label == label).map(|b| b.hours).unwrap()
    }

    fn today(entries: &[TimeEntry]) -> Vec<Bucket> {
        let range = Period::Today.resolve(date(2024, 3, 6), &Utc);
        aggregate(entries, &range, &Utc, DayFill::Calendar)
    }

    #[test]
    fn test_entry_inside_one_hour() {
        let buckets = today(&[entry_at(at(2024, 3, 6, 9, 15), 30, None)]);
        assert_eq!(buckets.len(), 24);
        assert_eq!(hours_of(&buckets, "09:00"), 0.5);
        assert_eq!(buckets.iter().filter(|b| b.hours != 0.0).count(), 1);
    }

    #[test]
    fn test_short_entry_crossing_boundary_stays_in_start_hour() {
        let buckets = today(&[entry_at(at(2024, 3, 6, 9, 40), 30, None)]);
        assert_eq!(hours_of(&buckets, "09:00"), 0.5);
        assert_eq!(hours_of(&buckets, "10:00"), 0.0);
    }

    #[test]
    fn test_long_entry_is_split_across_hours() {
        let buckets = today(&[entry_at(at(2024, 3, 6, 9, 40), 90, None)]);
        let nine = buckets.iter().find(|b| b.label == "09:00").unwrap();
        let ten = buckets.iter().find(|b| b.label == "10:00").unwrap();
        let eleven = buckets.iter().find(|b| b.label == "11:00").unwrap();

        assert_eq!(nine.display_hours(), 0.33);
        assert_eq!(ten.display_hours(), 1.0);
        assert_eq!(eleven.display_hours(), 0.17);

        let total: f64 = buckets.iter().map(|b| b.hours).sum();
        assert!((total - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_exact_hour_entry_fills_one_bucket() {
        let buckets = today(&[entry_at(at(2024, 3, 6, 9, 0), 60, None)]);
        assert!((hours_of(&buckets, "09:00") - 1.0).abs() < EPSILON);
        assert_eq!(hours_of(&buckets, "10:00"), 0.0);
    }

    #[test]
    fn test_split_preserves_total_for_many_boundaries() {
        for minutes in [61, 125, 240, 371, 600, 1439] {
            let buckets = today(&[entry_at(at(2024, 3, 6, 7, 23), minutes, None)]);
            let total: f64 = buckets.iter().map(|b| b.hours).sum();
            assert!(
                (total - minutes as f64 / 60.0).abs() < EPSILON,
                "{} minutes attributed {}",
                minutes,
                total
            );
        }
    }

    #[test]
    fn test_entry_past_midnight_wraps_into_early_hours() {
        let buckets = today(&[entry_at(at(2024, 3, 6, 23, 30), 120, None)]);
        assert!((hours_of(&buckets, "23:00") - 0.5).abs() < EPSILON);
        assert!((hours_of(&buckets, "00:00") - 1.0).abs() < EPSILON);
        assert!((hours_of(&buckets, "01:00") - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_unrepresentable_duration_is_skipped() {
        let mut broken = entry_at(at(2024, 3, 6, 9, 0), 60, None);
        broken.interval.duration_seconds = i64::MAX;
        let buckets = today(&[broken, entry_at(at(2024, 3, 6, 14, 0), 30, None)]);

        assert_eq!(hours_of(&buckets, "09:00"), 0.0);
        assert_eq!(hours_of(&buckets, "14:00"), 0.5);
    }

    #[test]
    fn test_hours_use_local_clock() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        let range = Period::Today.resolve(date(2024, 3, 6), &cet);
        let buckets = aggregate(&[entry_at(at(2024, 3, 6, 8, 0), 30, None)], &range, &cet, DayFill::Calendar);
        assert_eq!(hours_of(&buckets, "09:00"), 0.5);
        assert_eq!(hours_of(&buckets, "08:00"), 0.0);
    }

    #[test]
    fn test_hour_labels_are_chronological() {
        let buckets = today(&[]);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
        assert_eq!(labels[0], "00:00");
        assert_eq!(labels[23], "23:00");
    }

    #[test]
    fn test_week_always_has_seven_weekdays() {
        let range = Period::Week.resolve(date(2024, 3, 6), &Utc);
        // Wednesday
        let entries = vec![
            entry_at(at(2024, 3, 6, 9, 0), 60, None),
            entry_at(at(2024, 3, 6, 14, 0), 150, None),
        ];
        let buckets = aggregate(&entries, &range, &Utc, DayFill::Calendar);

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, WEEKDAY_LABELS);
        assert_eq!(hours_of(&buckets, "Wed"), 3.5);
        assert_eq!(buckets.iter().filter(|b| b.hours == 0.0).count(), 6);

        let empty = aggregate(&[], &range, &Utc, DayFill::Observed);
        assert_eq!(empty.len(), 7);
    }

    #[test]
    fn test_year_has_twelve_months() {
        let range = Period::Year.resolve(date(2024, 3, 6), &Utc);
        let entries = vec![
            entry_at(at(2024, 2, 10, 9, 0), 90, None),
            entry_at(at(2024, 2, 11, 9, 0), 30, None),
            entry_at(at(2024, 11, 1, 9, 0), 60, None),
        ];
        let buckets = aggregate(&entries, &range, &Utc, DayFill::Calendar);

        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].label, "Jan");
        assert_eq!(buckets[11].label, "Dec");
        assert_eq!(hours_of(&buckets, "Feb"), 2.0);
        assert_eq!(hours_of(&buckets, "Nov"), 1.0);
        assert_eq!(hours_of(&buckets, "Jan"), 0.0);
    }

    #[test]
    fn test_month_zero_fills_every_day() {
        let range = Period::Month.resolve(date(2024, 2, 15), &Utc);
        let entries = vec![entry_at(at(2024, 2, 10, 9, 0), 90, None)];
        let buckets = aggregate(&entries, &range, &Utc, DayFill::Calendar);

        assert_eq!(buckets.len(), 29);
        assert_eq!(buckets[0].label, "01/02");
        assert_eq!(buckets[28].label, "29/02");
        assert_eq!(hours_of(&buckets, "10/02"), 1.5);
    }

    #[test]
    fn test_observed_fill_only_lists_tracked_days_in_order() {
        let range = Period::Month.resolve(date(2024, 2, 15), &Utc);
        let entries = vec![
            entry_at(at(2024, 2, 20, 9, 0), 60, None),
            entry_at(at(2024, 2, 3, 9, 0), 30, None),
            entry_at(at(2024, 2, 20, 15, 0), 60, None),
        ];
        let buckets = aggregate(&entries, &range, &Utc, DayFill::Observed);

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["03/02", "20/02"]);
        assert_eq!(buckets[1].hours, 2.0);
    }

    #[test]
    fn test_last_three_days_across_new_year() {
        let range = Period::Last3Days.resolve(date(2024, 1, 1), &Utc);
        let entries = vec![
            entry_at(at(2024, 1, 1, 9, 0), 60, None),
            entry_at(at(2023, 12, 30, 9, 0), 30, None),
        ];
        let buckets = aggregate(&entries, &range, &Utc, DayFill::Calendar);

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["30/12", "31/12", "01/01"]);
        assert_eq!(buckets[0].hours, 0.5);
        assert_eq!(buckets[1].hours, 0.0);
    }

    #[test]
    fn test_empty_input_never_fails() {
        for period in Period::ALL {
            let range = period.resolve(date(2024, 3, 6), &Utc);
            let calendar = aggregate(&[], &range, &Utc, DayFill::Calendar);
            assert!(calendar.iter().all(|b| b.hours == 0.0));
            assert!(!calendar.is_empty());

            let observed = aggregate(&[], &range, &Utc, DayFill::Observed);
            assert!(observed.iter().all(|b| b.hours == 0.0));
        }

        let range = Period::Month.resolve(date(2024, 3, 6), &Utc);
        assert!(aggregate(&[], &range, &Utc, DayFill::Observed).is_empty());
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let entries = vec![
            entry_at(at(2024, 3, 4, 8, 50), 200, Some("p1")),
            entry_at(at(2024, 3, 6, 13, 5), 45, None),
        ];
        for period in Period::ALL {
            let range = period.resolve(date(2024, 3, 6), &Utc);
            let first = aggregate(&entries, &range, &Utc, DayFill::Calendar);
            let second = aggregate(&entries, &range, &Utc, DayFill::Calendar);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_display_rounding_does_not_leak_into_sums() {
        // Three 20 minute entries in the same hour
        let entries: Vec<TimeEntry> = (0..3)
            .map(|i| entry_at(at(2024, 3, 6, 9, i * 20), 20, None))
            .collect();
        let buckets = today(&entries);
        assert!((hours_of(&buckets, "09:00") - 1.0).abs() < EPSILON);
        assert_eq!(buckets[9].display_hours(), 1.0);
    }

    #[test]
    fn test_projects_group_by_name() {
        let directory = ProjectDirectory::from_fetch(Ok(vec![
            Project { id: "p1".into(), name: "Website".into() },
            Project { id: "p2".into(), name: "Backend".into() },
        ]));
        let entries = vec![
            entry_at(at(2024, 3, 6, 9, 0), 60, Some("p1")),
            entry_at(at(2024, 3, 6, 10, 0), 120, Some("p2")),
            entry_at(at(2024, 3, 6, 13, 0), 30, Some("p1")),
            entry_at(at(2024, 3, 6, 14, 0), 15, None),
        ];
        let buckets = aggregate_by_project(&entries, &directory);

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Backend", "Website", UNASSIGNED_LABEL]);
        assert_eq!(buckets[1].hours, 1.5);
        assert_eq!(buckets[2].hours, 0.25);
    }

    #[test]
    fn test_projects_degrade_to_sentinel_when_directory_unavailable() {
        let directory = ProjectDirectory::from_fetch(Err(crate::api::ApiError::MissingApiKey));
        let entries = vec![
            entry_at(at(2024, 3, 6, 9, 0), 60, Some("p1")),
            entry_at(at(2024, 3, 6, 10, 0), 60, Some("p2")),
        ];
        let buckets = aggregate_by_project(&entries, &directory);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, UNASSIGNED_LABEL);
        assert_eq!(buckets[0].hours, 2.0);
    }

    #[test]
    fn test_total_hours() {
        let entries = vec![
            entry_at(at(2024, 3, 6, 9, 0), 45, None),
            entry_at(at(2024, 3, 6, 10, 0), 75, None),
        ];
        assert_eq!(total_hours(&entries), 2.0);
        assert_eq!(total_hours(&[]), 0.0);
    }
}
