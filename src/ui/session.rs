//! View state of the dashboard: fetched reports, chart models, request
//! sequencing and the transient error banner.

use chrono::{NaiveDate, TimeZone};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

use super::charts::{BarChart, ChartSet, PieChart};
use crate::api::{ApiError, Project, TimeEntry};
use crate::report::{self, DayFill, Period, PeriodRange, ProjectDirectory};

/// How long an error banner stays on screen
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(3);

/// Kinds of data fetched independently of each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataCategory {
    Entries(Period),
    Projects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Hands out monotonic tokens so only the newest response per category is applied
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    pending: HashMap<DataCategory, u64>,
}

impl RequestSequencer {
    pub fn issue(&mut self, category: DataCategory) -> RequestToken {
        self.next += 1;
        self.pending.insert(category, self.next);
        RequestToken(self.next)
    }

    /// True when `token` is the latest issued for `category`; the request then stops being pending
    pub fn accept(&mut self, category: DataCategory, token: RequestToken) -> bool {
        if self.pending.get(&category) == Some(&token.0) {
            self.pending.remove(&category);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, category: DataCategory) -> bool {
        self.pending.contains_key(&category)
    }

    pub fn any_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub message: String,
    pub is_error: bool,
    shown_at: Instant,
}

impl Banner {
    pub fn error(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            is_error: true,
            shown_at: now,
        }
    }

    pub fn info(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            shown_at: now,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= BANNER_TIMEOUT
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        BANNER_TIMEOUT.saturating_sub(now.saturating_duration_since(self.shown_at))
    }
}

/// Entries fetched for one period
#[derive(Debug, Clone)]
pub struct PeriodReport {
    pub range: PeriodRange,
    pub entries: Vec<TimeEntry>,
}

impl PeriodReport {
    pub fn total_hours(&self) -> f64 {
        report::total_hours(&self.entries)
    }
}

pub struct Dashboard {
    pub selected_date: NaiveDate,
    pub selected_period: Period,
    pub reports: BTreeMap<Period, PeriodReport>,
    pub directory: ProjectDirectory,
    pub charts: ChartSet,
    pub banner: Option<Banner>,
    /// Categories whose latest fetch failed for lack of a connection
    offline: HashSet<DataCategory>,
    sequencer: RequestSequencer,
}

impl Dashboard {
    pub fn new(selected_date: NaiveDate, selected_period: Period) -> Self {
        Self {
            selected_date,
            selected_period,
            reports: BTreeMap::new(),
            directory: ProjectDirectory::default(),
            charts: ChartSet::default(),
            banner: None,
            offline: HashSet::new(),
            sequencer: RequestSequencer::default(),
        }
    }

    pub fn is_offline(&self) -> bool {
        !self.offline.is_empty()
    }

    /// Forget connection failures, e.g. before a retry
    pub fn clear_offline(&mut self) {
        self.offline.clear();
    }

    fn set_offline(&mut self, category: DataCategory, offline: bool) {
        if offline {
            self.offline.insert(category);
        } else {
            self.offline.remove(&category);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.sequencer.any_pending()
    }

    pub fn is_period_loading(&self, period: Period) -> bool {
        self.sequencer.is_pending(DataCategory::Entries(period))
    }

    pub fn selected_report(&self) -> Option<&PeriodReport> {
        self.reports.get(&self.selected_period)
    }

    /// Resolve the range to fetch for `period` and tag the request
    pub fn request_entries<Tz: TimeZone>(&mut self, period: Period, tz: &Tz) -> (PeriodRange, RequestToken) {
        let range = period.resolve(self.selected_date, tz);
        let token = self.sequencer.issue(DataCategory::Entries(period));
        (range, token)
    }

    pub fn request_projects(&mut self) -> RequestToken {
        self.directory = ProjectDirectory::default();
        self.sequencer.issue(DataCategory::Projects)
    }

    /// Apply a time-entries response. Returns false when it was superseded by a newer request.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_entries<Tz: TimeZone>(
        &mut self,
        period: Period,
        token: RequestToken,
        range: PeriodRange,
        result: Result<Vec<TimeEntry>, ApiError>,
        tz: &Tz,
        fill: DayFill,
        now: Instant,
    ) -> bool {
        if !self.sequencer.accept(DataCategory::Entries(period), token) {
            log::debug!("Discarding stale {} response", period);
            return false;
        }

        let category = DataCategory::Entries(period);
        self.set_offline(category, matches!(&result, Err(e) if e.is_offline()));

        match result {
            Ok(entries) => {
                log::info!("Loaded {} entries for {}", entries.len(), period);
                self.reports.insert(period, PeriodReport { range, entries });
                self.rebuild_distribution(period, tz, fill);
                if period == self.selected_period {
                    self.rebuild_pie();
                }
            }
            Err(e) if e.is_offline() => {
                log::error!("Offline while loading {}: {}", period, e);
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", period, e);
                let cause = if e.is_auth() {
                    "check your API key in Settings".to_string()
                } else {
                    e.to_string()
                };
                self.banner = Some(Banner::error(
                    format!("Could not load {} data: {}", period.display_name().to_lowercase(), cause),
                    now,
                ));
            }
        }
        true
    }

    /// Apply the project list. A failed fetch leaves the directory unavailable but
    /// charts and table keep rendering with the sentinel name.
    pub fn apply_projects(&mut self, token: RequestToken, result: Result<Vec<Project>, ApiError>) -> bool {
        if !self.sequencer.accept(DataCategory::Projects, token) {
            log::debug!("Discarding stale project list");
            return false;
        }
        self.set_offline(DataCategory::Projects, matches!(&result, Err(e) if e.is_offline()));
        self.directory = ProjectDirectory::from_fetch(result);
        if self.directory.is_loaded() {
            log::info!("Loaded {} projects", self.directory.len());
        }
        self.rebuild_pie();
        true
    }

    pub fn select_period(&mut self, period: Period) {
        if self.selected_period != period {
            self.selected_period = period;
            self.rebuild_pie();
        }
    }

    /// Drop all fetched data, e.g. when the reference date changes
    pub fn clear_reports(&mut self) {
        self.reports.clear();
        self.charts = ChartSet::default();
    }

    pub fn show_error(&mut self, message: impl Into<String>, now: Instant) {
        self.banner = Some(Banner::error(message, now));
    }

    pub fn show_info(&mut self, message: impl Into<String>, now: Instant) {
        self.banner = Some(Banner::info(message, now));
    }

    /// Hide the banner once its time is up
    pub fn expire_banner(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| b.is_expired(now)) {
            self.banner = None;
        }
    }

    pub fn rebuild_distribution<Tz: TimeZone>(&mut self, period: Period, tz: &Tz, fill: DayFill) {
        let Some(report) = self.reports.get(&period) else {
            return;
        };
        self.charts.replace_distribution(period, || {
            let buckets = report::aggregate(&report.entries, &report.range, tz, fill);
            BarChart::new(period.chart_title(), buckets)
        });
    }

    pub fn rebuild_all_distributions<Tz: TimeZone>(&mut self, tz: &Tz, fill: DayFill) {
        let periods: Vec<Period> = self.reports.keys().copied().collect();
        for period in periods {
            self.rebuild_distribution(period, tz, fill);
        }
    }

    fn rebuild_pie(&mut self) {
        let Some(report) = self.reports.get(&self.selected_period) else {
            self.charts.clear_pie();
            return;
        };
        let directory = &self.directory;
        self.charts.replace_pie(|| {
            PieChart::new(report::aggregate_by_project(&report.entries, directory))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Interval;
    use crate::report::UNASSIGNED_LABEL;
    use chrono::Utc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
    }

    fn entry(hour: u32, minutes: i64, project: Option<&str>) -> TimeEntry {
        let start = Utc.with_ymd_and_hms(2024, 3, 6, hour, 0, 0).unwrap();
        TimeEntry {
            id: format!("{}", hour),
            project_id: project.map(String::from),
            description: "work".to_string(),
            interval: Interval {
                start,
                end: start + chrono::Duration::minutes(minutes),
                duration_seconds: minutes * 60,
            },
        }
    }

    #[test]
    fn test_sequencer_only_accepts_latest_token() {
        let mut seq = RequestSequencer::default();
        let category = DataCategory::Entries(Period::Week);
        let first = seq.issue(category);
        let second = seq.issue(category);

        assert!(!seq.accept(category, first));
        assert!(seq.is_pending(category));
        assert!(seq.accept(category, second));
        assert!(!seq.is_pending(category));
        // A duplicate delivery is not applied twice
        assert!(!seq.accept(category, second));
    }

    #[test]
    fn test_sequencer_categories_are_independent() {
        let mut seq = RequestSequencer::default();
        let week = seq.issue(DataCategory::Entries(Period::Week));
        let projects = seq.issue(DataCategory::Projects);
        assert!(seq.accept(DataCategory::Projects, projects));
        assert!(seq.any_pending());
        assert!(seq.accept(DataCategory::Entries(Period::Week), week));
        assert!(!seq.any_pending());
    }

    #[test]
    fn test_banner_expires_after_timeout() {
        let t0 = Instant::now();
        let banner = Banner::error("boom", t0);
        assert!(!banner.is_expired(t0 + Duration::from_millis(2999)));
        assert!(banner.is_expired(t0 + BANNER_TIMEOUT));
        assert_eq!(banner.remaining(t0 + Duration::from_secs(1)), Duration::from_secs(2));
    }

    #[test]
    fn test_dashboard_expires_banner() {
        let t0 = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Week);
        dashboard.show_error("boom", t0);
        dashboard.expire_banner(t0 + Duration::from_secs(1));
        assert!(dashboard.banner.is_some());
        dashboard.expire_banner(t0 + Duration::from_secs(3));
        assert!(dashboard.banner.is_none());
    }

    #[test]
    fn test_stale_entries_response_is_discarded() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Week);
        let (old_range, old_token) = dashboard.request_entries(Period::Week, &Utc);
        let (new_range, new_token) = dashboard.request_entries(Period::Week, &Utc);

        // Newer request answers first
        assert!(dashboard.apply_entries(
            Period::Week, new_token, new_range, Ok(vec![entry(9, 60, None)]),
            &Utc, DayFill::Calendar, now,
        ));
        assert!(!dashboard.apply_entries(
            Period::Week, old_token, old_range, Ok(vec![]),
            &Utc, DayFill::Calendar, now,
        ));

        let report = dashboard.selected_report().unwrap();
        assert_eq!(report.entries.len(), 1);
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn test_entries_build_distribution_and_pie() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Week);
        let (range, token) = dashboard.request_entries(Period::Week, &Utc);
        dashboard.apply_entries(
            Period::Week, token, range,
            Ok(vec![entry(9, 60, Some("p1")), entry(13, 150, Some("p1"))]),
            &Utc, DayFill::Calendar, now,
        );

        let chart = dashboard.charts.distribution(Period::Week).unwrap();
        assert_eq!(chart.bars.len(), 7);
        assert_eq!(chart.bars[2].hours, 3.5);

        // Directory not loaded yet, so everything is unassigned
        let pie = dashboard.charts.pie().unwrap();
        assert_eq!(pie.slices.len(), 1);
        assert_eq!(pie.slices[0].label, UNASSIGNED_LABEL);
    }

    #[test]
    fn test_projects_relabel_pie() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Today);
        let projects_token = dashboard.request_projects();
        let (range, token) = dashboard.request_entries(Period::Today, &Utc);
        dashboard.apply_entries(
            Period::Today, token, range, Ok(vec![entry(9, 60, Some("p1"))]),
            &Utc, DayFill::Calendar, now,
        );
        dashboard.apply_projects(
            projects_token,
            Ok(vec![Project { id: "p1".into(), name: "Website".into() }]),
        );

        let pie = dashboard.charts.pie().unwrap();
        assert_eq!(pie.slices[0].label, "Website");
    }

    #[test]
    fn test_project_failure_still_renders() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Today);
        let projects_token = dashboard.request_projects();
        let (range, token) = dashboard.request_entries(Period::Today, &Utc);
        dashboard.apply_entries(
            Period::Today, token, range,
            Ok(vec![entry(9, 60, Some("p1")), entry(11, 30, Some("p2"))]),
            &Utc, DayFill::Calendar, now,
        );
        dashboard.apply_projects(projects_token, Err(ApiError::MissingApiKey));

        assert!(dashboard.directory.unavailable_reason().is_some());
        let pie = dashboard.charts.pie().unwrap();
        assert_eq!(pie.slices.len(), 1);
        assert_eq!(pie.slices[0].label, UNASSIGNED_LABEL);
        assert_eq!(pie.slices[0].hours, 1.5);
    }

    #[test]
    fn test_fetch_error_shows_banner() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Week);
        let (range, token) = dashboard.request_entries(Period::Month, &Utc);
        let applied = dashboard.apply_entries(
            Period::Month, token, range,
            Err(ApiError::Status { status: reqwest::StatusCode::UNAUTHORIZED, body: String::new() }),
            &Utc, DayFill::Calendar, now,
        );

        assert!(applied);
        let banner = dashboard.banner.as_ref().unwrap();
        assert!(banner.is_error);
        assert!(banner.message.contains("month"));
        assert!(banner.message.contains("API key"));
        assert!(!dashboard.is_offline());
        assert!(dashboard.charts.distribution(Period::Month).is_none());
    }

    #[test]
    fn test_selecting_period_swaps_pie_source() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Today);
        let (range, token) = dashboard.request_entries(Period::Year, &Utc);
        dashboard.apply_entries(
            Period::Year, token, range, Ok(vec![entry(9, 60, None)]),
            &Utc, DayFill::Calendar, now,
        );
        assert!(dashboard.charts.pie().is_none());

        dashboard.select_period(Period::Year);
        assert!(dashboard.charts.pie().is_some());

        dashboard.select_period(Period::Month);
        assert!(dashboard.charts.pie().is_none());
    }

    #[test]
    fn test_fill_setting_rebuilds_day_charts() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Month);
        let (range, token) = dashboard.request_entries(Period::Month, &Utc);
        dashboard.apply_entries(
            Period::Month, token, range, Ok(vec![entry(9, 60, None)]),
            &Utc, DayFill::Calendar, now,
        );
        assert_eq!(dashboard.charts.distribution(Period::Month).unwrap().bars.len(), 31);

        dashboard.rebuild_all_distributions(&Utc, DayFill::Observed);
        assert_eq!(dashboard.charts.distribution(Period::Month).unwrap().bars.len(), 1);
    }

    #[test]
    fn test_offline_persists_until_failed_category_recovers() {
        let now = Instant::now();
        let mut dashboard = Dashboard::new(date(), Period::Week);
        let (week_range, week_token) = dashboard.request_entries(Period::Week, &Utc);
        let (today_range, today_token) = dashboard.request_entries(Period::Today, &Utc);

        // Week could not connect; Today then loads fine
        dashboard.set_offline(DataCategory::Entries(Period::Week), true);
        dashboard.apply_entries(
            Period::Today, today_token, today_range, Ok(vec![]),
            &Utc, DayFill::Calendar, now,
        );
        assert!(dashboard.is_offline());

        dashboard.apply_entries(
            Period::Week, week_token, week_range, Ok(vec![]),
            &Utc, DayFill::Calendar, now,
        );
        assert!(!dashboard.is_offline());
    }

    #[test]
    fn test_clear_offline_before_retry() {
        let mut dashboard = Dashboard::new(date(), Period::Week);
        dashboard.set_offline(DataCategory::Projects, true);
        dashboard.set_offline(DataCategory::Entries(Period::Year), true);
        assert!(dashboard.is_offline());
        dashboard.clear_offline();
        assert!(!dashboard.is_offline());
    }
}
