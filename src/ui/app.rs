use chrono::{Local, Utc};
use eframe::egui;
use egui::{Color32, RichText};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use super::charts::{paint_bar_chart, paint_pie_chart};
use super::session::{Dashboard, RequestToken};
use super::theme;
use super::views::{self, DateNav, StopwatchAction};
use crate::api::{convert_entries, ApiError, ClockifyClient, Project, TimeEntry};
use crate::config::{Config, TimeFormat};
use crate::report::{DayFill, Period, PeriodRange};
use crate::stopwatch::Stopwatch;

const API_KEY_URL: &str = "https://app.clockify.me/user/preferences#advanced";

pub struct DashboardApp {
    config: Config,
    state: AppState,
    dashboard: Dashboard,
    stopwatch: Stopwatch,
    jump_date_text: String,

    // Settings dialog
    show_settings: bool,
    settings_api_key: String,
    settings_workspace_id: String,
    settings_user_id: String,
    settings_base_url: String,
    settings_font_scale: f32,
    settings_time_format: TimeFormat,
    settings_default_period: Period,
    settings_fill_empty_days: bool,

    // Async communication
    runtime: tokio::runtime::Runtime,
    result_rx: Receiver<AsyncResult>,
    result_tx: Sender<AsyncResult>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AppState {
    Setup,
    Main,
}

enum AsyncResult {
    EntriesLoaded {
        period: Period,
        token: RequestToken,
        range: PeriodRange,
        result: Result<Vec<TimeEntry>, ApiError>,
    },
    ProjectsLoaded {
        token: RequestToken,
        result: Result<Vec<Project>, ApiError>,
    },
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> std::io::Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            log::warn!("Using default config: {:#}", e);
            Config::default()
        });
        super::setup_fonts(&cc.egui_ctx);
        super::setup_theme(&cc.egui_ctx);

        let state = if config.is_configured() {
            AppState::Main
        } else {
            AppState::Setup
        };

        let runtime = tokio::runtime::Runtime::new()?;
        let (result_tx, result_rx) = channel();
        let today = Local::now().date_naive();

        let mut app = Self {
            dashboard: Dashboard::new(today, config.default_period),
            stopwatch: Stopwatch::new(),
            jump_date_text: String::new(),
            show_settings: false,
            settings_api_key: String::new(),
            settings_workspace_id: config.workspace_id.clone(),
            settings_user_id: config.user_id.clone(),
            settings_base_url: config.base_url.clone(),
            settings_font_scale: config.font_scale,
            settings_time_format: config.time_format,
            settings_default_period: config.default_period,
            settings_fill_empty_days: config.fill_empty_days,
            config,
            state,
            runtime,
            result_rx,
            result_tx,
        };

        if state == AppState::Main {
            app.load_projects();
            app.refresh_all();
        }

        Ok(app)
    }

    fn day_fill(&self) -> DayFill {
        DayFill::from_config(self.config.fill_empty_days)
    }

    fn check_async_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                AsyncResult::EntriesLoaded { period, token, range, result } => {
                    let fill = self.day_fill();
                    self.dashboard.apply_entries(period, token, range, result, &Local, fill, Instant::now());
                }
                AsyncResult::ProjectsLoaded { token, result } => {
                    self.dashboard.apply_projects(token, result);
                }
            }
        }
    }

    /// Fetch entries for every period at the current reference date
    fn refresh_all(&mut self) {
        for period in Period::ALL {
            self.load_period(period);
        }
    }

    fn load_period(&mut self, period: Period) {
        if !self.config.is_configured() {
            return;
        }

        let (range, token) = self.dashboard.request_entries(period, &Local);
        let config = self.config.clone();
        let tx = self.result_tx.clone();

        self.runtime.spawn(async move {
            let result = async {
                let client = ClockifyClient::new(&config)?;
                let raw = client.get_time_entries(&range).await?;
                let (mut entries, skipped) = convert_entries(raw, Utc::now());
                entries.retain(|e| range.contains(e.interval.start));
                if skipped > 0 {
                    log::warn!("Skipped {} malformed entries for {}", skipped, period);
                }
                Ok::<_, ApiError>(entries)
            }
            .await;

            let _ = tx.send(AsyncResult::EntriesLoaded { period, token, range, result });
        });
    }

    fn load_projects(&mut self) {
        if !self.config.is_configured() {
            return;
        }

        let token = self.dashboard.request_projects();
        let config = self.config.clone();
        let tx = self.result_tx.clone();

        self.runtime.spawn(async move {
            let result = async {
                let client = ClockifyClient::new(&config)?;
                client.get_projects().await
            }
            .await;

            let _ = tx.send(AsyncResult::ProjectsLoaded { token, result });
        });
    }

    fn select_date(&mut self, date: chrono::NaiveDate) {
        if date == self.dashboard.selected_date {
            return;
        }
        self.dashboard.selected_date = date;
        self.dashboard.clear_reports();
        self.refresh_all();
    }

    fn select_period(&mut self, period: Period) {
        self.dashboard.select_period(period);
        self.load_period(period);
    }

    fn open_settings(&mut self) {
        self.settings_api_key = String::new();
        self.settings_workspace_id = self.config.workspace_id.clone();
        self.settings_user_id = self.config.user_id.clone();
        self.settings_base_url = self.config.base_url.clone();
        self.settings_font_scale = self.config.font_scale;
        self.settings_time_format = self.config.time_format;
        self.settings_default_period = self.config.default_period;
        self.settings_fill_empty_days = self.config.fill_empty_days;
        self.show_settings = true;
    }

    fn save_settings(&mut self) {
        let workspace_id = self.settings_workspace_id.trim().to_string();
        let user_id = self.settings_user_id.trim().to_string();
        let base_url = self.settings_base_url.trim().to_string();

        let credentials_changed = self.config.workspace_id != workspace_id
            || self.config.user_id != user_id
            || self.config.base_url != base_url
            || !self.settings_api_key.trim().is_empty();
        let fill_changed = self.config.fill_empty_days != self.settings_fill_empty_days;

        self.config.workspace_id = workspace_id;
        self.config.user_id = user_id;
        self.config.base_url = base_url;
        self.config.font_scale = self.settings_font_scale;
        self.config.time_format = self.settings_time_format;
        self.config.default_period = self.settings_default_period;
        self.config.fill_empty_days = self.settings_fill_empty_days;

        if !self.settings_api_key.trim().is_empty() {
            self.config.api_key = Some(self.settings_api_key.trim().to_string());
        }

        match self.config.save() {
            Ok(_) => {
                self.show_settings = false;
                self.dashboard.show_info("Settings saved", Instant::now());
                self.settings_api_key.clear();
                if self.config.is_configured() && self.state == AppState::Setup {
                    self.state = AppState::Main;
                }
                if credentials_changed {
                    self.dashboard.clear_reports();
                    self.dashboard.clear_offline();
                    self.load_projects();
                    self.refresh_all();
                } else if fill_changed {
                    let fill = self.day_fill();
                    self.dashboard.rebuild_all_distributions(&Local, fill);
                }
            }
            Err(e) => {
                log::error!("Failed to save config: {:#}", e);
                self.dashboard.show_error(format!("Failed to save: {}", e), Instant::now());
            }
        }
    }

    fn render_setup(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Tallyboard setup");
            ui.add_space(20.0);

            ui.label("Enter your Clockify credentials to get started.");
            ui.add_space(8.0);

            api_key_link(ui, "Find your API key in Clockify");
            ui.add_space(20.0);
        });

        egui::Grid::new("setup_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("API key:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_api_key)
                        .password(true)
                        .hint_text("Paste your API key here")
                        .desired_width(350.0),
                );
                ui.end_row();

                ui.label("Workspace ID:");
                ui.add(egui::TextEdit::singleline(&mut self.settings_workspace_id).desired_width(350.0));
                ui.end_row();

                ui.label("User ID:");
                ui.add(egui::TextEdit::singleline(&mut self.settings_user_id).desired_width(350.0));
                ui.end_row();
            });

        ui.add_space(20.0);

        if ui.button("Save and connect").clicked() {
            self.save_settings();
        }
    }

    fn render_main(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(nav) = views::render_date_nav(ui, self.dashboard.selected_date, &mut self.jump_date_text) {
                if matches!(nav, DateNav::Jump(_)) {
                    self.jump_date_text.clear();
                }
                let date = nav.apply(self.dashboard.selected_date, Local::now().date_naive());
                self.select_date(date);
            }

            if let Some(report) = self.dashboard.selected_report() {
                ui.add_space(8.0);
                ui.label(RichText::new(report.range.describe()).size(13.0).color(Color32::from_rgb(144, 144, 136)));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if icon_button(ui, egui_phosphor::regular::FADERS_HORIZONTAL, "Settings") {
                    self.open_settings();
                }
                ui.add_space(12.0);
                if icon_button(ui, egui_phosphor::regular::CLOUD_ARROW_DOWN, "Reload from Clockify") {
                    self.refresh_all();
                }
                ui.add_space(12.0);

                match views::render_stopwatch(ui, &self.stopwatch) {
                    Some(StopwatchAction::Start) => self.stopwatch.start(Instant::now()),
                    Some(StopwatchAction::Stop) => self.stopwatch.stop(),
                    Some(StopwatchAction::Reset) => self.stopwatch.reset(Instant::now()),
                    None => {}
                }
            });
        });

        ui.add_space(8.0);

        if let Some(banner) = &self.dashboard.banner {
            if views::render_banner(ui, banner) {
                self.dashboard.banner = None;
            }
        }

        if self.dashboard.is_offline() {
            if views::render_offline(ui) {
                self.dashboard.clear_offline();
                if !self.dashboard.directory.is_loaded() {
                    self.load_projects();
                }
                self.refresh_all();
            }
            return;
        }

        if let Some(period) = views::render_period_tabs(ui, &self.dashboard, self.config.time_format) {
            self.select_period(period);
        }

        ui.add_space(8.0);

        let time_format = self.config.time_format;
        let section_color = Color32::from_rgb(140, 140, 160);
        let dashboard = &self.dashboard;

        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Projects").color(section_color).strong());
                views::render_directory_badge(ui, &dashboard.directory);
            });
            match dashboard.charts.pie() {
                Some(pie) => paint_pie_chart(ui, pie, time_format, 180.0),
                None => {
                    ui.label(RichText::new("Loading…").color(Color32::from_rgb(112, 112, 104)));
                }
            }

            ui.add_space(16.0);
            ui.label(RichText::new("Distribution").color(section_color).strong());
            for period in Period::ALL {
                if let Some(chart) = dashboard.charts.distribution(period) {
                    paint_bar_chart(ui, chart, time_format, 160.0);
                    ui.add_space(8.0);
                }
            }

            ui.add_space(16.0);
            ui.label(RichText::new("Entries").color(section_color).strong());
            if let Some(report) = dashboard.selected_report() {
                views::render_entries_table(ui, &report.entries, &dashboard.directory, time_format);
            }
        });
    }

    fn render_settings(&mut self, ui: &mut egui::Ui) {
        let section_color = Color32::from_rgb(140, 140, 160);

        ui.label(RichText::new("Clockify Connection").color(section_color).strong());
        ui.add_space(8.0);

        if self.config.has_overrides() {
            ui.label(
                RichText::new("Environment variables override some of these values and are not saved")
                    .size(13.0)
                    .color(Color32::from_rgb(0xff, 0xb0, 0x00)),
            );
            ui.add_space(8.0);
        }

        egui::Grid::new("clockify_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("API key");
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_api_key)
                        .password(true)
                        .hint_text("Leave blank to keep existing")
                        .desired_width(350.0),
                );
                ui.end_row();

                ui.label("Workspace ID");
                ui.add(egui::TextEdit::singleline(&mut self.settings_workspace_id).desired_width(350.0));
                ui.end_row();

                ui.label("User ID");
                ui.add(egui::TextEdit::singleline(&mut self.settings_user_id).desired_width(350.0));
                ui.end_row();

                ui.label("API base URL");
                ui.add(egui::TextEdit::singleline(&mut self.settings_base_url).desired_width(350.0));
                ui.end_row();

                ui.label("");
                api_key_link(ui, "Find your API key in Clockify");
                ui.end_row();
            });

        ui.add_space(20.0);

        ui.label(RichText::new("Display").color(section_color).strong());
        ui.add_space(8.0);

        egui::Grid::new("display_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("Font scale");
                ui.horizontal(|ui| {
                    ui.add(egui::Slider::new(&mut self.settings_font_scale, 0.75..=2.0).show_value(false));
                    ui.label(format!("{:.0}%", self.settings_font_scale * 100.0));
                });
                ui.end_row();

                ui.label("Duration format");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut self.settings_time_format, TimeFormat::HoursMinutes, "3h 15m");
                    ui.radio_value(&mut self.settings_time_format, TimeFormat::Decimal, "3.25h");
                });
                ui.end_row();

                ui.label("Start on");
                egui::ComboBox::from_id_salt("default_period")
                    .selected_text(self.settings_default_period.display_name())
                    .show_ui(ui, |ui| {
                        for period in Period::ALL {
                            ui.selectable_value(&mut self.settings_default_period, period, period.display_name());
                        }
                    });
                ui.end_row();

                ui.label("Empty days");
                ui.checkbox(&mut self.settings_fill_empty_days, "Show days without entries");
                ui.end_row();
            });

        ui.add_space(24.0);

        ui.horizontal(|ui| {
            if dialog_button(ui, "Save") {
                self.save_settings();
            }
            if dialog_button(ui, "Cancel") {
                self.show_settings = false;
            }
        });
    }
}

fn api_key_link(ui: &mut egui::Ui, text: &str) {
    let link = ui.add(egui::Label::new(
        RichText::new(text).size(14.0).color(theme::ACCENT)
    ).sense(egui::Sense::click()));
    if link.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    if link.clicked() {
        if let Err(e) = open::that(API_KEY_URL) {
            log::warn!("Could not open browser: {}", e);
        }
    }
}

/// Gray icon, white on hover. Returns true when clicked.
fn icon_button(ui: &mut egui::Ui, icon: &str, tooltip: &str) -> bool {
    let text_color = Color32::from_rgb(150, 150, 150);
    let font_id = egui::FontId::proportional(18.0);
    let icon_size = ui.fonts(|f| f.layout_no_wrap(icon.to_string(), font_id.clone(), Color32::WHITE).size());
    let (rect, response) = ui.allocate_exact_size(icon_size + egui::vec2(8.0, 4.0), egui::Sense::click());
    let color = if response.hovered() { Color32::WHITE } else { text_color };
    ui.painter().text(rect.center(), egui::Align2::CENTER_CENTER, icon, font_id, color);
    response.on_hover_text(tooltip).clicked()
}

fn dialog_button(ui: &mut egui::Ui, text: &str) -> bool {
    let btn_bg = Color32::from_rgb(0x28, 0x28, 0x26);
    let btn_hover = Color32::from_rgb(0x50, 0x50, 0x4a);
    let text_color = Color32::from_rgb(180, 180, 190);
    let font_id = egui::FontId::proportional(17.0);
    let padding = egui::vec2(18.0, 10.0);

    let size = ui.fonts(|f| f.layout_no_wrap(text.to_string(), font_id.clone(), text_color).size());
    let (rect, response) = ui.allocate_exact_size(size + padding * 2.0, egui::Sense::click());
    let bg = if response.hovered() { btn_hover } else { btn_bg };
    ui.painter().rect_filled(rect, egui::Rounding::same(6.0), bg);
    ui.painter().text(rect.center(), egui::Align2::CENTER_CENTER, text, font_id, text_color);
    response.clicked()
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pinch-to-zoom adjusts the font scale
        let zoom_delta = ctx.input(|i| i.zoom_delta());
        if zoom_delta != 1.0 {
            self.config.font_scale = (self.config.font_scale * zoom_delta).clamp(0.75, 2.5);
            if (zoom_delta - 1.0).abs() > 0.01 {
                if let Err(e) = self.config.save() {
                    log::warn!("Failed to save font scale: {:#}", e);
                }
            }
        }
        ctx.set_pixels_per_point(self.config.font_scale);

        self.check_async_results();

        let now = Instant::now();
        self.dashboard.expire_banner(now);
        self.stopwatch.tick(now);

        // Keep polling while work is in flight or something on screen is timed
        if self.dashboard.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if self.stopwatch.is_running() {
            ctx.request_repaint_after(Duration::from_secs(1));
        }
        if let Some(banner) = &self.dashboard.banner {
            ctx.request_repaint_after(banner.remaining(now));
        }

        if self.show_settings {
            let (content_bg, frame_color) = theme::dialog_colors();
            let dialog_frame = egui::Frame::none()
                .fill(content_bg)
                .stroke(egui::Stroke::new(2.0, frame_color))
                .rounding(egui::Rounding::same(8.0))
                .inner_margin(egui::Margin::same(20.0));

            egui::Window::new("Settings")
                .collapsible(false)
                .resizable(false)
                .default_width(650.0)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .frame(dialog_frame)
                .show(ctx, |ui| {
                    self.render_settings(ui);
                });
        }

        egui::CentralPanel::default().frame(
            egui::Frame::none().inner_margin(egui::Margin::symmetric(12.0, 8.0))
        ).show(ctx, |ui| {
            // Thin loading strip at the top, fixed height so nothing shifts
            let (rect, _) = ui.allocate_exact_size(egui::vec2(ui.available_width(), 4.0), egui::Sense::hover());
            if self.dashboard.is_loading() && ui.is_rect_visible(rect) {
                let t = ctx.input(|i| i.time) as f32;
                let width = rect.width() * 0.25;
                let x = rect.left() + (t * 0.6).fract() * (rect.width() + width) - width;
                let strip = egui::Rect::from_min_max(
                    egui::pos2(x.max(rect.left()), rect.top()),
                    egui::pos2((x + width).min(rect.right()), rect.bottom()),
                );
                ui.painter().rect_filled(strip, 0.0, theme::ACCENT);
            }

            match self.state {
                AppState::Setup => {
                    if let Some(banner) = &self.dashboard.banner {
                        if views::render_banner(ui, banner) {
                            self.dashboard.banner = None;
                        }
                    }
                    self.render_setup(ui);
                }
                AppState::Main => self.render_main(ui),
            }
        });
    }
}
