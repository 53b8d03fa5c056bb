//! eframe::App implementation - frame loop and layout.

use std::time::Duration;

use eframe::egui::{self, Align2, Color32, FontId, Rect, UiBuilder};
use log::trace;

use super::AnnotatorApp;
use crate::dialogs::prefs::render_settings_window;
use crate::editor::view::ViewKind;
use crate::widgets::canvas;
use crate::widgets::inspector::{self, SampleInfo};
use crate::widgets::scene3d;

const LABEL_COLOR: Color32 = Color32::from_rgb(170, 170, 180);
const INSPECTOR_WIDTH: f32 = 280.0;

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_events();
        self.handle_keyboard_input(ctx);

        let redraw = self.session.take_redraw();
        if redraw.canvases {
            trace!("Rebuilding 2D canvases");
            self.canvases.rebuild_all(&self.session, self.cloud.as_ref());
        }

        self.status_bar.render(ctx, &self.session);

        egui::SidePanel::right("inspector")
            .default_width(INSPECTOR_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let sample = SampleInfo {
                        id: self.current_id.as_deref(),
                        neighbours: &self.neighbours,
                        excluded: self.excluded,
                        point_count: self.cloud.as_ref().map_or(0, |c| c.len()),
                    };
                    let actions = inspector::render(ui, &self.session, &sample);
                    self.inspector_hovered = actions.hovered;
                    actions.dispatch(&self.event_bus);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let full = ui.available_rect_before_wrap();
                let half = full.size() / 2.0;
                let quad = |col: f32, row: f32| {
                    Rect::from_min_size(full.min + egui::vec2(col * half.x, row * half.y), half).shrink(1.0)
                };

                let scene_rect = quad(0.0, 0.0);
                ui.scope_builder(UiBuilder::new().max_rect(scene_rect), |ui| {
                    scene3d::render(ui, &mut self.scene, &self.session, self.cloud.as_ref(), redraw.scene);
                });
                paint_label(ui, scene_rect, "3D");

                let placements = [
                    (ViewKind::Top, quad(1.0, 0.0)),
                    (ViewKind::Front, quad(0.0, 1.0)),
                    (ViewKind::Side, quad(1.0, 1.0)),
                ];
                for (view, rect) in placements {
                    ui.scope_builder(UiBuilder::new().max_rect(rect), |ui| {
                        canvas::render(ui, view, &mut self.session, self.canvases.get(view));
                    });
                    paint_label(ui, rect, view.display_name());
                }
            });

        if self.show_settings {
            let changed =
                render_settings_window(ctx, &mut self.show_settings, &mut self.settings, &mut self.settings_category);
            if changed {
                self.apply_settings();
            }
        }

        // Actions queued by the panels this frame.
        self.handle_events();

        if self.session.redraw_pending() {
            ctx.request_repaint_after(Duration::from_millis(self.settings.redraw_interval_ms));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(json) = serde_json::to_string(self) {
            storage.set_string(eframe::APP_KEY, json);
            trace!("App state saved: last sample {:?}", self.last_id);
        }
    }
}

fn paint_label(ui: &egui::Ui, rect: Rect, text: &str) {
    ui.painter().text(
        rect.min + egui::vec2(6.0, 4.0),
        Align2::LEFT_TOP,
        text,
        FontId::proportional(12.0),
        LABEL_COLOR,
    );
}
