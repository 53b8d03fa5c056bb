//! 3D view widget - orbit input and painting.

use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke};
use glam::DVec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::editor::session::EditorSession;
use crate::entities::point_cloud::PointCloud;
use crate::render::camera::{OrbitCamera, Scene3d, project_scene};

const BACKGROUND: Color32 = Color32::from_rgb(16, 16, 20);
const BOX_IDLE: Color32 = Color32::from_rgb(200, 200, 90);
const BOX_SELECTED: Color32 = Color32::from_rgb(120, 255, 150);
/// Radians per pixel of orbit drag.
const ORBIT_SPEED: f64 = 0.008;
const DOLLY_STEP: f64 = 0.1;

/// Camera plus cached projection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene3dState {
    pub camera: OrbitCamera,
    #[serde(skip)]
    cache: Scene3d,
    #[serde(skip)]
    viewport: DVec2,
    #[serde(skip)]
    dirty: bool,
}

impl Scene3dState {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Frame the selected box, or the whole cloud without one.
    pub fn frame_selection(&mut self, session: &EditorSession, cloud: Option<&PointCloud>) {
        match (session.selected(), cloud) {
            (Some(b), _) => self.camera.frame_box(b),
            (None, Some(c)) => self.camera.frame_cloud(c),
            (None, None) => return,
        }
        debug!("[3d] target {:?} distance {:.2}", self.camera.target, self.camera.distance);
        self.dirty = true;
    }

    fn rebuild(&mut self, session: &EditorSession, cloud: Option<&PointCloud>) {
        self.cache = project_scene(
            &self.camera,
            cloud,
            session.boxes().as_slice(),
            session.selected_index(),
            self.viewport,
            session.sample_step(),
        );
        self.dirty = false;
    }
}

/// Render the 3D view. `scene_dirty` comes from the session redraw flags.
pub fn render(
    ui: &mut egui::Ui,
    state: &mut Scene3dState,
    session: &EditorSession,
    cloud: Option<&PointCloud>,
    scene_dirty: bool,
) -> bool {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    let viewport = DVec2::new(rect.width() as f64, rect.height() as f64);
    if viewport != state.viewport {
        state.viewport = viewport;
        state.dirty = true;
    }

    if response.dragged_by(egui::PointerButton::Primary) {
        let d = response.drag_delta();
        state.camera.orbit(d.x as f64 * ORBIT_SPEED, d.y as f64 * ORBIT_SPEED);
        state.dirty = true;
    }
    if response.hovered() {
        let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
        if scroll.abs() > 0.1 {
            let factor = if scroll > 0.0 { 1.0 - DOLLY_STEP } else { 1.0 + DOLLY_STEP };
            state.camera.dolly(factor);
            state.dirty = true;
        }
    }

    if state.dirty || scene_dirty {
        state.rebuild(session, cloud);
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, BACKGROUND);
    let origin = rect.min;
    let at = |p: DVec2| Pos2::new(origin.x + p.x as f32, origin.y + p.y as f32);

    let dot = egui::vec2(1.5, 1.5);
    for p in &state.cache.points {
        let c = p.color.map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8);
        painter.rect_filled(Rect::from_center_size(at(p.screen), dot), 0.0, Color32::from_rgb(c[0], c[1], c[2]));
    }
    // Selected last so it draws on top.
    let mut wires: Vec<_> = state.cache.boxes.iter().collect();
    wires.sort_by_key(|w| w.selected);
    for wire in wires {
        let stroke = if wire.selected { Stroke::new(2.0, BOX_SELECTED) } else { Stroke::new(1.0, BOX_IDLE) };
        for e in &wire.edges {
            painter.line_segment([at(e.a), at(e.b)], stroke);
        }
    }
    painter.text(
        rect.min + egui::vec2(6.0, 4.0),
        egui::Align2::LEFT_TOP,
        "3D",
        egui::FontId::monospace(12.0),
        Color32::from_gray(180),
    );

    response.hovered()
}
