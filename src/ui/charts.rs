//! Chart models built from aggregated buckets, and their painting.
//!
//! Models are rebuilt wholesale on every refresh; `ChartSet` drops the old
//! model before building its replacement.

use egui::{Align2, Color32, FontId, Rect, Sense, Shape, Stroke, Ui};
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::theme::{chart_colors, chart_palette};
use crate::api::format_hours_with_format;
use crate::config::TimeFormat;
use crate::report::{Bucket, Period};

const EMPTY_TEXT: &str = "No data available";

#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<Bucket>,
    pub max_hours: f64,
    pub total_hours: f64,
}

impl BarChart {
    pub fn new(title: impl Into<String>, bars: Vec<Bucket>) -> Self {
        let max_hours = bars.iter().map(|b| b.hours).fold(0.0, f64::max);
        let total_hours = bars.iter().map(|b| b.hours).sum();
        Self {
            title: title.into(),
            bars,
            max_hours,
            total_hours,
        }
    }

    /// No bars, or only empty ones
    pub fn is_empty(&self) -> bool {
        self.max_hours <= 0.0
    }

    /// Bar height as a share of the tallest bar
    pub fn height_ratio(&self, index: usize) -> f32 {
        match self.bars.get(index) {
            Some(bar) if self.max_hours > 0.0 => (bar.hours / self.max_hours) as f32,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PieSlice {
    pub label: String,
    pub hours: f64,
    pub fraction: f32,
    pub color: Color32,
}

#[derive(Debug, Clone, Default)]
pub struct PieChart {
    pub slices: Vec<PieSlice>,
    pub total_hours: f64,
}

impl PieChart {
    pub fn new(buckets: Vec<Bucket>) -> Self {
        let total_hours: f64 = buckets.iter().map(|b| b.hours).sum();
        if total_hours <= 0.0 {
            return Self::default();
        }

        let palette = chart_palette();
        let slices = buckets
            .into_iter()
            .filter(|b| b.hours > 0.0)
            .enumerate()
            .map(|(i, b)| PieSlice {
                fraction: (b.hours / total_hours) as f32,
                color: palette[i % palette.len()],
                label: b.label,
                hours: b.hours,
            })
            .collect();

        Self { slices, total_hours }
    }

    /// Slice under `angle`, measured clockwise from twelve o'clock in radians
    pub fn slice_at(&self, angle: f32) -> Option<usize> {
        let angle = angle.rem_euclid(TAU);
        let mut end = 0.0;
        for (i, slice) in self.slices.iter().enumerate() {
            end += slice.fraction * TAU;
            if angle < end {
                return Some(i);
            }
        }
        // Float slack at the very end of the circle
        if self.slices.is_empty() {
            None
        } else {
            Some(self.slices.len() - 1)
        }
    }
}

/// Chart models currently on screen
#[derive(Debug, Default)]
pub struct ChartSet {
    pie: Option<PieChart>,
    distributions: BTreeMap<Period, BarChart>,
}

impl ChartSet {
    pub fn pie(&self) -> Option<&PieChart> {
        self.pie.as_ref()
    }

    pub fn distribution(&self, period: Period) -> Option<&BarChart> {
        self.distributions.get(&period)
    }

    pub fn replace_pie<F: FnOnce() -> PieChart>(&mut self, build: F) {
        self.pie = None;
        self.pie = Some(build());
    }

    pub fn clear_pie(&mut self) {
        self.pie = None;
    }

    pub fn replace_distribution<F: FnOnce() -> BarChart>(&mut self, period: Period, build: F) {
        self.distributions.remove(&period);
        self.distributions.insert(period, build());
    }
}

pub fn paint_bar_chart(ui: &mut Ui, chart: &BarChart, time_format: TimeFormat, height: f32) {
    let (bg, border, accent, muted) = chart_colors();

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(&chart.title).color(muted));
        if !chart.is_empty() {
            ui.label(egui::RichText::new(format_hours_with_format(chart.total_hours, time_format)).color(Color32::WHITE).strong());
        }
    });

    let desired = egui::vec2(ui.available_width(), height);
    let (rect, response) = ui.allocate_exact_size(desired, Sense::hover());
    if !ui.is_rect_visible(rect) {
        return;
    }

    let painter = ui.painter_at(rect);
    painter.rect(rect, 8.0, bg, Stroke::new(1.0, border));

    if chart.is_empty() {
        painter.text(rect.center(), Align2::CENTER_CENTER, EMPTY_TEXT, FontId::proportional(14.0), muted);
        return;
    }

    let label_height = 18.0;
    let plot = Rect::from_min_max(
        rect.min + egui::vec2(12.0, 12.0),
        rect.max - egui::vec2(12.0, 8.0 + label_height),
    );
    let count = chart.bars.len();
    let slot = plot.width() / count as f32;
    let bar_width = (slot * 0.7).max(1.0);
    // Thin out labels so they do not overlap on month charts
    let label_every = ((count as f32 * 38.0 / plot.width()).ceil() as usize).max(1);

    let mut hovered = None;
    for (i, bar) in chart.bars.iter().enumerate() {
        let x = plot.left() + slot * (i as f32 + 0.5);
        let bar_height = chart.height_ratio(i) * plot.height();
        let column = Rect::from_min_max(
            egui::pos2(x - slot / 2.0, plot.top()),
            egui::pos2(x + slot / 2.0, rect.bottom()),
        );
        let is_hovered = response.hover_pos().is_some_and(|p| column.contains(p));
        if is_hovered {
            hovered = Some(i);
        }

        if bar_height > 0.0 {
            let bar_rect = Rect::from_min_max(
                egui::pos2(x - bar_width / 2.0, plot.bottom() - bar_height),
                egui::pos2(x + bar_width / 2.0, plot.bottom()),
            );
            let fill = if is_hovered { Color32::WHITE } else { accent };
            painter.rect_filled(bar_rect, 2.0, fill);
        }

        if i % label_every == 0 {
            painter.text(
                egui::pos2(x, plot.bottom() + 4.0),
                Align2::CENTER_TOP,
                &bar.label,
                FontId::proportional(11.0),
                muted,
            );
        }
    }

    if let Some(i) = hovered {
        let bar = &chart.bars[i];
        response.on_hover_text_at_pointer(format!(
            "{}: {}",
            bar.label,
            format_hours_with_format(bar.display_hours(), time_format)
        ));
    }
}

pub fn paint_pie_chart(ui: &mut Ui, chart: &PieChart, time_format: TimeFormat, diameter: f32) {
    let (bg, border, _accent, muted) = chart_colors();

    ui.horizontal(|ui| {
        let (rect, response) = ui.allocate_exact_size(egui::vec2(diameter, diameter), Sense::hover());
        let center = rect.center();
        let radius = diameter / 2.0 - 4.0;
        let painter = ui.painter_at(rect);

        if chart.slices.is_empty() {
            painter.circle(center, radius, bg, Stroke::new(1.0, border));
            painter.text(center, Align2::CENTER_CENTER, EMPTY_TEXT, FontId::proportional(12.0), muted);
            return;
        }

        let hovered = response.hover_pos().and_then(|p| {
            let d = p - center;
            if d.length() > radius {
                None
            } else {
                chart.slice_at(d.y.atan2(d.x) + FRAC_PI_2)
            }
        });

        let mut start = -FRAC_PI_2;
        for (i, slice) in chart.slices.iter().enumerate() {
            let sweep = slice.fraction * TAU;
            let grow = if hovered == Some(i) { 3.0 } else { 0.0 };
            paint_slice(&painter, center, radius + grow, start, sweep, slice.color);
            start += sweep;
        }

        if let Some(i) = hovered {
            let slice = &chart.slices[i];
            response.on_hover_text_at_pointer(format!(
                "{}: {} ({:.0}%)",
                slice.label,
                format_hours_with_format(slice.hours, time_format),
                slice.fraction * 100.0
            ));
        }

        ui.add_space(16.0);

        // Legend
        ui.vertical(|ui| {
            for slice in &chart.slices {
                ui.horizontal(|ui| {
                    let (swatch, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), Sense::hover());
                    ui.painter().rect_filled(swatch, 3.0, slice.color);
                    ui.label(&slice.label);
                    ui.label(
                        egui::RichText::new(format_hours_with_format(slice.hours, time_format))
                            .color(muted),
                    );
                });
            }
        });
    });
}

/// Paint one pie wedge as convex pieces of at most a quarter turn
fn paint_slice(painter: &egui::Painter, center: egui::Pos2, radius: f32, start: f32, sweep: f32, color: Color32) {
    if sweep <= 0.0 {
        return;
    }
    let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let piece_sweep = sweep / pieces as f32;

    for piece in 0..pieces {
        let from = start + piece_sweep * piece as f32;
        let steps = ((piece_sweep / TAU) * 96.0).ceil().max(2.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for k in 0..=steps {
            let angle = from + piece_sweep * k as f32 / steps as f32;
            points.push(center + egui::vec2(angle.cos(), angle.sin()) * radius);
        }
        painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
    }
}
