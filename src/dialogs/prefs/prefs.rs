use eframe::egui;

use crate::config::EditorSettings;

/// Settings categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsCategory {
    #[default]
    Editing,
    Views,
    Loading,
    Annotator,
}

impl SettingsCategory {
    const ALL: [SettingsCategory; 4] = [
        SettingsCategory::Editing,
        SettingsCategory::Views,
        SettingsCategory::Loading,
        SettingsCategory::Annotator,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SettingsCategory::Editing => "Editing",
            SettingsCategory::Views => "Views",
            SettingsCategory::Loading => "Loading",
            SettingsCategory::Annotator => "Annotator",
        }
    }
}

/// Render Editing settings category
fn render_editing_settings(ui: &mut egui::Ui, settings: &mut EditorSettings) -> bool {
    let mut changed = false;
    ui.heading("Handles");
    ui.add_space(8.0);

    ui.label("Pick radius:");
    changed |= ui.add(egui::Slider::new(&mut settings.hit_radius_px, 4.0..=40.0).suffix(" px")).changed();

    ui.label("Minimum box extent:");
    changed |= ui
        .add(egui::Slider::new(&mut settings.size_floor, 0.001..=0.5).logarithmic(true).suffix(" m"))
        .changed();

    ui.add_space(16.0);
    ui.heading("Keyboard");
    ui.add_space(8.0);
    ui.label("Nudge step (metres or radians):");
    changed |= ui.add(egui::DragValue::new(&mut settings.nudge_step).speed(0.001).range(0.0001..=1.0)).changed();
    ui.label("Hold R (rotate), C (move) or D (resize), an axis key X/Y/Z, then press ←/→.");
    changed
}

/// Render Views settings category
fn render_view_settings(ui: &mut egui::Ui, settings: &mut EditorSettings) -> bool {
    let mut changed = false;
    ui.heading("2D views");
    ui.add_space(8.0);

    ui.label("Box fill on selection:");
    changed |= ui.add(egui::Slider::new(&mut settings.target_occupancy, 0.1..=1.0)).changed();

    ui.label("Wheel zoom per notch:");
    changed |= ui.add(egui::Slider::new(&mut settings.wheel_zoom_step, 0.01..=0.5)).changed();

    ui.label("Depth margin behind the box (fraction of size):");
    changed |= ui.add(egui::Slider::new(&mut settings.depth_extension_ratio, 0.0..=2.0)).changed();

    changed |= ui.checkbox(&mut settings.show_grid, "Show 1 m grid").changed();

    ui.add_space(16.0);
    ui.heading("Performance");
    ui.add_space(8.0);
    ui.label("Draw every Nth point (idle / dragging):");
    ui.horizontal(|ui| {
        changed |= ui.add(egui::DragValue::new(&mut settings.sample_step_idle).range(1..=64)).changed();
        changed |= ui.add(egui::DragValue::new(&mut settings.sample_step_dragging).range(1..=64)).changed();
    });
    ui.label("Redraw interval while dragging:");
    changed |= ui
        .add(egui::Slider::new(&mut settings.redraw_interval_ms, 0..=100).suffix(" ms"))
        .changed();
    changed
}

/// Render Loading settings category
fn render_loading_settings(ui: &mut egui::Ui, settings: &mut EditorSettings) -> bool {
    ui.heading("Point cloud");
    ui.add_space(8.0);
    ui.label("Drop points farther than:");
    let changed = ui
        .add(egui::Slider::new(&mut settings.max_depth, 1.0..=2000.0).logarithmic(true).suffix(" m"))
        .changed();
    ui.label("Takes effect on the next sample load.");
    changed
}

fn render_annotator_settings(ui: &mut egui::Ui, settings: &mut EditorSettings) -> bool {
    ui.heading("Annotator");
    ui.add_space(8.0);
    ui.label("Name written with saves and opt-outs:");
    ui.text_edit_singleline(&mut settings.annotator).changed()
}

/// Render settings window. Returns true if any value changed this frame.
pub fn render_settings_window(
    ctx: &egui::Context,
    show_settings: &mut bool,
    settings: &mut EditorSettings,
    selected: &mut SettingsCategory,
) -> bool {
    let mut changed = false;

    egui::Window::new("Settings")
        .id(egui::Id::new("settings_window"))
        .open(show_settings)
        .default_size([560.0, 380.0])
        .resizable(true)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(140.0);
                    ui.add_space(4.0);
                    for category in SettingsCategory::ALL {
                        if ui.selectable_label(*selected == category, category.as_str()).clicked() {
                            *selected = category;
                        }
                    }
                    ui.add_space(16.0);
                    if ui.button("Reset to defaults").clicked() {
                        let annotator = std::mem::take(&mut settings.annotator);
                        *settings = EditorSettings { annotator, ..EditorSettings::default() };
                        changed = true;
                    }
                });

                ui.separator();

                ui.vertical(|ui| {
                    ui.add_space(8.0);
                    changed |= match selected {
                        SettingsCategory::Editing => render_editing_settings(ui, settings),
                        SettingsCategory::Views => render_view_settings(ui, settings),
                        SettingsCategory::Loading => render_loading_settings(ui, settings),
                        SettingsCategory::Annotator => render_annotator_settings(ui, settings),
                    };
                });
            });
        });

    changed
}
