use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const ACCENT: Color32 = Color32::from_rgb(19, 152, 244);
pub const ERROR: Color32 = Color32::from_rgb(224, 108, 117);
pub const SUCCESS: Color32 = Color32::from_rgb(152, 195, 121);

/// Font family for filled Phosphor icons
pub fn phosphor_fill_family() -> FontFamily {
    FontFamily::Name("phosphor-fill".into())
}

pub fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Phosphor Regular as fallback in the proportional family
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    // Filled icons get their own family; proportional fonts stay as fallback
    fonts.font_data.insert(
        "phosphor-fill".into(),
        egui_phosphor::Variant::Fill.font_data(),
    );
    let mut fill_family = vec!["phosphor-fill".to_owned()];
    if let Some(proportional) = fonts.families.get(&FontFamily::Proportional) {
        fill_family.extend(proportional.iter().cloned());
    }
    fonts.families.insert(phosphor_fill_family(), fill_family);

    ctx.set_fonts(fonts);
}

pub fn setup_theme(ctx: &egui::Context) {
    let mut style = Style::default();
    let mut visuals = Visuals::dark();

    let bg = Color32::BLACK;
    visuals.panel_fill = bg;
    visuals.window_fill = bg;
    visuals.faint_bg_color = Color32::from_rgb(20, 20, 18);
    visuals.extreme_bg_color = bg;

    // Warm grays (R=G > B)
    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(40, 40, 38);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(176, 176, 168));

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(56, 56, 52);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(200, 200, 192));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(80, 80, 74);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = ACCENT;

    visuals.widgets.noninteractive.rounding = Rounding::same(6.0);
    visuals.widgets.inactive.rounding = Rounding::same(6.0);
    visuals.widgets.hovered.rounding = Rounding::same(6.0);
    visuals.widgets.active.rounding = Rounding::same(6.0);
    visuals.window_rounding = Rounding::same(8.0);

    style.visuals = visuals;

    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(12.0, 10.0);
    style.spacing.button_padding = egui::vec2(18.0, 10.0);
    style.spacing.window_margin = egui::Margin::same(24.0);

    ctx.set_style(style);
}

/// Returns (bg_color, border_color, accent) for period tabs
pub fn tab_colors() -> (Color32, Color32, Color32) {
    (
        Color32::BLACK,
        Color32::from_rgb(56, 56, 52),
        ACCENT,
    )
}

/// Returns (label_color, hours_color) for period tabs
pub fn tab_text_colors(is_selected: bool) -> (Color32, Color32) {
    if is_selected {
        (Color32::from_rgb(208, 208, 200), Color32::WHITE)
    } else {
        (Color32::from_rgb(112, 112, 104), Color32::WHITE)
    }
}

/// Returns (bg_color, border_color, bar_color, muted_text) for chart cards
pub fn chart_colors() -> (Color32, Color32, Color32, Color32) {
    (
        Color32::from_rgb(12, 12, 11),
        Color32::from_rgb(56, 56, 52),
        ACCENT,
        Color32::from_rgb(144, 144, 136),
    )
}

/// Slice colors for the project pie, cycled when there are more projects
pub fn chart_palette() -> [Color32; 8] {
    [
        ACCENT,
        Color32::from_rgb(0xdc, 0x26, 0x7f),
        Color32::from_rgb(0xfe, 0x61, 0x00),
        Color32::from_rgb(0xff, 0xb0, 0x00),
        SUCCESS,
        Color32::from_rgb(0x78, 0x5e, 0xf0),
        Color32::from_rgb(0x2e, 0xc4, 0xb6),
        Color32::from_rgb(176, 176, 168),
    ]
}

/// Returns (bg_color, text_color) for button-like elements
pub fn button_colors() -> (Color32, Color32) {
    (
        Color32::from_rgb(56, 56, 52),
        Color32::from_rgb(200, 200, 192),
    )
}

/// Returns (content_bg, frame_color) for dialogs
pub fn dialog_colors() -> (Color32, Color32) {
    (
        Color32::BLACK,
        Color32::from_rgb(40, 40, 38),
    )
}
