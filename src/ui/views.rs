use chrono::{Duration, Local, NaiveDate};
use egui::{Color32, RichText, Ui};

use super::session::{Banner, Dashboard, PeriodReport};
use super::theme::{self, button_colors, tab_colors, tab_text_colors};
use crate::api::{format_duration_with_format, format_hours_with_format, TimeEntry};
use crate::config::TimeFormat;
use crate::report::{DirectoryState, Period, ProjectDirectory};
use crate::stopwatch::Stopwatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateNav {
    Previous,
    Next,
    PreviousWeek,
    NextWeek,
    Today,
    Jump(NaiveDate),
}

impl DateNav {
    pub fn apply(self, date: NaiveDate, today: NaiveDate) -> NaiveDate {
        match self {
            DateNav::Previous => date - Duration::days(1),
            DateNav::Next => date + Duration::days(1),
            DateNav::PreviousWeek => date - Duration::weeks(1),
            DateNav::NextWeek => date + Duration::weeks(1),
            DateNav::Today => today,
            DateNav::Jump(target) => target,
        }
    }
}

/// Date typed into the jump field, as `2024-03-06` or `06/03/2024`
pub fn parse_jump_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchAction {
    Start,
    Stop,
    Reset,
}

/// Text under a period tab: the total once loaded, an ellipsis while loading
pub fn tab_hours_text(report: Option<&PeriodReport>, loading: bool, time_format: TimeFormat) -> String {
    match report {
        _ if loading => "…".to_string(),
        Some(report) => {
            let hours = report.total_hours();
            if hours > 0.0 {
                format_hours_with_format(hours, time_format)
            } else {
                "0".to_string()
            }
        }
        None => String::new(),
    }
}

/// Render the period tabs with their totals. Returns the clicked period.
pub fn render_period_tabs(ui: &mut Ui, dashboard: &Dashboard, time_format: TimeFormat) -> Option<Period> {
    let mut clicked = None;
    let (bg_color, border_color, _accent) = tab_colors();

    ui.horizontal(|ui| {
        for period in Period::ALL {
            let is_selected = period == dashboard.selected_period;
            let hours_text = tab_hours_text(
                dashboard.reports.get(&period),
                dashboard.is_period_loading(period),
                time_format,
            );

            let stroke = if is_selected {
                egui::Stroke::new(1.0, Color32::WHITE)
            } else {
                egui::Stroke::new(1.0, border_color)
            };
            let (label_color, hours_color) = tab_text_colors(is_selected);

            let tab_size = egui::vec2(84.0, 64.0);
            let (rect, response) = ui.allocate_exact_size(tab_size, egui::Sense::click());

            if ui.is_rect_visible(rect) {
                let painter = ui.painter();
                painter.rect(rect, 8.0, bg_color, stroke);
                painter.text(
                    egui::pos2(rect.center().x, rect.min.y + 24.0),
                    egui::Align2::CENTER_CENTER,
                    period.display_name(),
                    egui::FontId::proportional(14.0),
                    label_color,
                );
                painter.text(
                    egui::pos2(rect.center().x, rect.min.y + 44.0),
                    egui::Align2::CENTER_CENTER,
                    &hours_text,
                    egui::FontId::proportional(14.0),
                    hours_color,
                );
            }

            if response.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            }
            if response.clicked() {
                clicked = Some(period);
            }

            ui.add_space(2.0);
        }
    });

    clicked
}

/// Pill with day and week carets around the reference date, a jump field
/// and a Today link. `jump_text` holds the field's contents between frames.
pub fn render_date_nav(ui: &mut Ui, date: NaiveDate, jump_text: &mut String) -> Option<DateNav> {
    let mut nav = None;
    let (button_bg, button_text) = button_colors();

    egui::Frame::none()
        .fill(button_bg)
        .rounding(egui::Rounding::same(12.0))
        .inner_margin(egui::Margin::symmetric(8.0, 4.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                if caret(ui, egui_phosphor::regular::CARET_DOUBLE_LEFT, button_text).on_hover_text("Previous week").clicked() {
                    nav = Some(DateNav::PreviousWeek);
                }
                if caret(ui, egui_phosphor::regular::CARET_LEFT, button_text).on_hover_text("Previous day").clicked() {
                    nav = Some(DateNav::Previous);
                }

                ui.add_space(4.0);
                // Fixed width so the pill does not jump between dates
                ui.allocate_ui_with_layout(
                    egui::vec2(110.0, 14.0),
                    egui::Layout::centered_and_justified(egui::Direction::LeftToRight),
                    |ui| {
                        ui.label(RichText::new(date.format("%a %b %-d, %Y").to_string()).size(14.0).color(button_text));
                    },
                );
                ui.add_space(4.0);

                if caret(ui, egui_phosphor::regular::CARET_RIGHT, button_text).on_hover_text("Next day").clicked() {
                    nav = Some(DateNav::Next);
                }
                if caret(ui, egui_phosphor::regular::CARET_DOUBLE_RIGHT, button_text).on_hover_text("Next week").clicked() {
                    nav = Some(DateNav::NextWeek);
                }
            });
        });

    let jump = ui.add(
        egui::TextEdit::singleline(jump_text)
            .hint_text("YYYY-MM-DD")
            .desired_width(96.0),
    );
    if jump.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
        match parse_jump_date(jump_text) {
            Some(target) => nav = Some(DateNav::Jump(target)),
            None => log::debug!("Ignoring unparseable date {:?}", jump_text),
        }
    }

    if date != Local::now().date_naive() {
        let today = ui.add(egui::Label::new(
            RichText::new("Today").size(14.0).color(theme::ACCENT)
        ).sense(egui::Sense::click()));
        if today.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        if today.clicked() {
            nav = Some(DateNav::Today);
        }
    }

    nav
}

fn caret(ui: &mut Ui, icon: &str, color: Color32) -> egui::Response {
    let response = ui.add(egui::Label::new(
        RichText::new(icon).size(14.0).color(color)
    ).sense(egui::Sense::click()));
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    response
}

/// Entries of the selected period, oldest first
pub fn render_entries_table(
    ui: &mut Ui,
    entries: &[TimeEntry],
    directory: &ProjectDirectory,
    time_format: TimeFormat,
) {
    if entries.is_empty() {
        ui.add_space(12.0);
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("No time entries in this period").color(Color32::from_rgb(112, 112, 104)));
        });
        return;
    }

    let mut sorted: Vec<&TimeEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.interval.start);
    let header = Color32::from_rgb(144, 144, 136);

    egui::Grid::new("entries_table")
        .num_columns(4)
        .striped(true)
        .spacing([24.0, 8.0])
        .min_col_width(80.0)
        .show(ui, |ui| {
            for title in ["Project", "Description", "Duration", "Date"] {
                ui.label(RichText::new(title).color(header).strong());
            }
            ui.end_row();

            for entry in sorted {
                let local_start = entry.interval.start.with_timezone(&Local);
                ui.label(directory.resolve(entry.project_id.as_deref()));
                ui.add(egui::Label::new(&entry.description).truncate());
                ui.label(RichText::new(format_duration_with_format(entry.interval.duration_seconds, time_format)).color(Color32::WHITE));
                ui.label(local_start.format("%d/%m %H:%M").to_string());
                ui.end_row();
            }
        });
}

pub fn render_stopwatch(ui: &mut Ui, stopwatch: &Stopwatch) -> Option<StopwatchAction> {
    let mut action = None;
    let (button_bg, button_text) = button_colors();

    egui::Frame::none()
        .fill(button_bg)
        .rounding(egui::Rounding::same(12.0))
        .inner_margin(egui::Margin::symmetric(10.0, 4.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                let time_color = if stopwatch.is_running() { Color32::WHITE } else { button_text };
                ui.label(RichText::new(stopwatch.display()).monospace().size(14.0).color(time_color));

                let (icon, tooltip, clicked_action) = if stopwatch.is_running() {
                    (egui_phosphor::fill::STOP, "Stop", StopwatchAction::Stop)
                } else {
                    (egui_phosphor::fill::PLAY, "Start", StopwatchAction::Start)
                };
                let toggle = ui.add(egui::Label::new(
                    RichText::new(icon).size(14.0).family(theme::phosphor_fill_family()).color(button_text)
                ).sense(egui::Sense::click()));
                if toggle.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                if toggle.on_hover_text(tooltip).clicked() {
                    action = Some(clicked_action);
                }

                if stopwatch.elapsed_seconds() > 0 || stopwatch.is_running() {
                    let reset = caret(ui, egui_phosphor::regular::ARROW_COUNTER_CLOCKWISE, button_text);
                    if reset.on_hover_text("Reset").clicked() {
                        action = Some(StopwatchAction::Reset);
                    }
                }
            });
        });

    action
}

/// Transient status line. Returns true when the user dismissed it.
pub fn render_banner(ui: &mut Ui, banner: &Banner) -> bool {
    let mut dismiss = false;
    let color = if banner.is_error { theme::ERROR } else { theme::SUCCESS };
    let dim_color = Color32::from_rgb(120, 120, 130);

    ui.horizontal(|ui| {
        ui.add(egui::Label::new(RichText::new(&banner.message).color(color)));
        ui.add_space(8.0);

        let close_btn = ui.add(egui::Label::new(
            RichText::new(egui_phosphor::regular::X).size(14.0).color(dim_color)
        ).sense(egui::Sense::click()));
        if close_btn.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        if close_btn.clicked() {
            dismiss = true;
        }
    });
    ui.add_space(8.0);

    dismiss
}

/// Small warning shown while project names cannot be resolved
pub fn render_directory_badge(ui: &mut Ui, directory: &ProjectDirectory) {
    match directory.state() {
        DirectoryState::Unavailable(reason) => {
            ui.label(
                RichText::new(format!("{} Project names unavailable", egui_phosphor::regular::WARNING))
                    .size(13.0)
                    .color(Color32::from_rgb(0xff, 0xb0, 0x00)),
            )
            .on_hover_text(reason);
        }
        DirectoryState::Loading => {
            ui.label(RichText::new("Loading projects…").size(13.0).color(Color32::from_rgb(112, 112, 104)));
        }
        DirectoryState::Loaded(_) => {}
    }
}

/// Full-panel "No connection" message. Returns true when Retry was clicked.
pub fn render_offline(ui: &mut Ui) -> bool {
    let mut retry = false;
    ui.add_space(40.0);
    ui.vertical_centered(|ui| {
        ui.label(
            RichText::new(egui_phosphor::regular::WIFI_SLASH)
                .size(34.0)
                .color(theme::ERROR),
        );
        ui.add_space(16.0);
        ui.label(RichText::new("No connection").size(20.0).color(Color32::from_rgb(200, 200, 210)));
        ui.add_space(8.0);
        ui.label(
            RichText::new("Check your internet and try again")
                .size(14.0)
                .color(Color32::from_rgb(120, 120, 140)),
        );
        ui.add_space(24.0);
        if ui.add(
            egui::Button::new(
                RichText::new(format!("{} Retry", egui_phosphor::regular::ARROWS_CLOCKWISE))
                    .size(17.0)
                    .color(Color32::WHITE),
            )
            .fill(theme::ACCENT)
            .rounding(6.0),
        ).clicked() {
            retry = true;
        }
    });
    retry
}
