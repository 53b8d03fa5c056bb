//! 2D canvas widget - input routing and painting.

use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke};
use glam::DVec2;

use super::canvas::CanvasCache;
use crate::editor::handles::ControlKind;
use crate::editor::session::{EditorSession, PointerButton};
use crate::editor::view::ViewKind;
use crate::render::projection::{GridLineKind, Segment};

const BACKGROUND: Color32 = Color32::from_rgb(24, 24, 28);
const GRID_MINOR: Color32 = Color32::from_rgb(44, 44, 52);
const GRID_AXIS: Color32 = Color32::from_rgb(80, 80, 96);
const BOX_EDGE: Color32 = Color32::from_rgb(90, 200, 120);
const BOX_SILHOUETTE: Color32 = Color32::from_rgb(120, 255, 150);
const HANDLE_FILL: Color32 = Color32::from_rgb(240, 240, 240);
const HANDLE_HOVER: Color32 = Color32::from_rgb(255, 180, 40);
const CORNER_FILL: Color32 = Color32::from_rgb(80, 160, 255);
const POINT_SIZE: f32 = 2.0;
const HANDLE_RADIUS: f32 = 4.0;

/// Per-frame result for input routing in the app.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanvasResponse {
    pub hovered: bool,
    /// Pointer input was consumed by a handle or pan.
    pub interacted: bool,
}

/// Render one 2D view into the remaining space of `ui`.
pub fn render(ui: &mut egui::Ui, view: ViewKind, session: &mut EditorSession, cache: &CanvasCache) -> CanvasResponse {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    session.set_canvas_size(view, DVec2::new(rect.width() as f64, rect.height() as f64));

    let interacted = handle_canvas_input(ui.ctx(), rect, view, session, response.hovered());

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, BACKGROUND);
    paint_cache(&painter, rect.min, cache);
    painter.text(
        rect.min + egui::vec2(6.0, 4.0),
        egui::Align2::LEFT_TOP,
        view.display_name(),
        egui::FontId::monospace(12.0),
        Color32::from_gray(180),
    );

    CanvasResponse { hovered: response.hovered(), interacted }
}

fn to_pos(origin: Pos2, p: DVec2) -> Pos2 {
    egui::pos2(origin.x + p.x as f32, origin.y + p.y as f32)
}

fn segment(painter: &egui::Painter, origin: Pos2, s: &Segment, stroke: Stroke) {
    painter.line_segment([to_pos(origin, s.a), to_pos(origin, s.b)], stroke);
}

fn color(rgb: [f32; 3]) -> Color32 {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(c(rgb[0]), c(rgb[1]), c(rgb[2]))
}

fn paint_cache(painter: &egui::Painter, origin: Pos2, cache: &CanvasCache) {
    for line in &cache.grid {
        let stroke = match line.kind {
            GridLineKind::Minor => Stroke::new(1.0, GRID_MINOR),
            GridLineKind::Axis => Stroke::new(1.0, GRID_AXIS),
        };
        segment(painter, origin, &line.segment, stroke);
    }

    let dot = egui::vec2(POINT_SIZE, POINT_SIZE);
    for p in &cache.points {
        painter.rect_filled(Rect::from_center_size(to_pos(origin, p.screen), dot), 0.0, color(p.color));
    }

    if let Some(outline) = &cache.outline {
        for e in &outline.edges {
            segment(painter, origin, e, Stroke::new(1.0, BOX_EDGE));
        }
        for e in &outline.silhouette {
            segment(painter, origin, e, Stroke::new(2.0, BOX_SILHOUETTE));
        }
    }

    for h in &cache.handles {
        let fill = match (h.hovered, h.kind) {
            (true, _) => HANDLE_HOVER,
            (false, ControlKind::Corner(_)) => CORNER_FILL,
            _ => HANDLE_FILL,
        };
        let r = if h.hovered { HANDLE_RADIUS * 1.5 } else { HANDLE_RADIUS };
        painter.circle_filled(to_pos(origin, h.screen), r, fill);
    }
}

/// Forward pointer events inside `rect` to the session.
fn handle_canvas_input(ctx: &egui::Context, rect: Rect, view: ViewKind, session: &mut EditorSession, hovered: bool) -> bool {
    let (primary_pressed, secondary_pressed, released, latest, scroll) = ctx.input(|i| {
        (
            i.pointer.button_pressed(egui::PointerButton::Primary),
            i.pointer.button_pressed(egui::PointerButton::Secondary),
            i.pointer.any_released(),
            i.pointer.latest_pos(),
            i.raw_scroll_delta,
        )
    });
    let local = |p: Pos2| DVec2::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
    let mut interacted = false;

    match latest {
        Some(pos) if rect.contains(pos) => {
            let at = local(pos);
            if hovered && primary_pressed {
                interacted |= session.pointer_down(view, at, PointerButton::Primary);
            }
            if hovered && secondary_pressed {
                interacted |= session.pointer_down(view, at, PointerButton::Secondary);
            }
            session.pointer_move(view, at);
            if hovered && scroll.y.abs() > 0.1 {
                session.wheel(view, scroll.y.signum() as f64, at);
                interacted = true;
            }
        }
        _ => session.pointer_leave(view),
    }

    if released {
        session.pointer_up(view);
    }
    interacted
}
