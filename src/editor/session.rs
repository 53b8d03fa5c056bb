//! EditorSession - the editing engine behind the four views.
//!
//! Owns the box collection, the per-view reference frames, pan/zoom of the
//! three 2D canvases, the active drag and the held nudge keys. All input
//! arrives here synchronously from the UI thread; each handler finishes its
//! frame read, model mutation and dirty marking before the next one runs.
//!
//! Redraw policy: the 3D scene is dirtied on every mutation. The 2D canvases
//! are coalesced through `RedrawThrottle` while a drag is active.

use std::time::Instant;

use glam::DVec2;
use log::{debug, info};

use super::drag::DragSession;
use super::events::{BoxesChangedEvent, ChangeCause, LoadWarningsEvent, SelectionChangedEvent};
use super::frames::{ReferenceFrames, ViewReferenceFrame};
use super::handles::{self, ControlKind, ControlPoint, ViewPose};
use super::keys::{EditKey, HeldKeys};
use super::view::{ViewKind, ViewTransform};
use crate::config::EditorSettings;
use crate::core::event_bus::EventEmitter;
use crate::core::throttle::RedrawThrottle;
use crate::entities::annotation::LoadReport;
use crate::entities::collection::BoxCollection;
use crate::entities::oriented_box::OrientedBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Pick and drag handles.
    Primary,
    /// Pan the canvas.
    Secondary,
}

/// What needs repainting this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Redraw {
    pub scene: bool,
    pub canvases: bool,
}

#[derive(Debug)]
pub struct EditorSession {
    boxes: BoxCollection,
    frames: ReferenceFrames,
    views: [ViewTransform; 3],
    /// A real canvas size has arrived for the view.
    laid_out: [bool; 3],
    /// Fit computed against a placeholder size; redo on first layout.
    fit_pending: [bool; 3],
    drag: Option<DragSession>,
    pan: Option<(ViewKind, DVec2)>,
    hover: Option<(ViewKind, ControlKind)>,
    keys: HeldKeys,
    settings: EditorSettings,
    throttle: RedrawThrottle,
    scene_dirty: bool,
    canvases_dirty: bool,
    modified: bool,
    emitter: EventEmitter,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorSettings::default(), EventEmitter::detached())
    }
}

impl EditorSession {
    pub fn new(settings: EditorSettings, emitter: EventEmitter) -> Self {
        Self {
            boxes: BoxCollection::new(),
            frames: ReferenceFrames::default(),
            views: Default::default(),
            laid_out: [false; 3],
            fit_pending: [false; 3],
            drag: None,
            pan: None,
            hover: None,
            keys: HeldKeys::default(),
            throttle: RedrawThrottle::new(settings.redraw_interval_ms),
            settings,
            scene_dirty: true,
            canvases_dirty: true,
            modified: false,
            emitter,
        }
    }

    // ========== Accessors ==========

    pub fn boxes(&self) -> &BoxCollection {
        &self.boxes
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.boxes.selected_index()
    }

    pub fn selected(&self) -> Option<&OrientedBox> {
        self.boxes.selected()
    }

    pub fn frames(&self) -> &ReferenceFrames {
        &self.frames
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn hover(&self) -> Option<(ViewKind, ControlKind)> {
        self.hover
    }

    pub fn view(&self, view: ViewKind) -> &ViewTransform {
        &self.views[view.index()]
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.throttle.set_interval(settings.redraw_interval_ms);
        self.settings = settings;
        self.canvases_dirty = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Cloud sampling step for the canvases right now.
    pub fn sample_step(&self) -> usize {
        self.settings.sample_step(self.is_dragging())
    }

    /// Frame a view draws with (frozen during its own drag, live otherwise).
    pub fn effective_frame(&self, view: ViewKind) -> Option<ViewReferenceFrame> {
        let b = self.boxes.selected()?;
        Some(self.frames.effective(view, b))
    }

    pub fn pose(&self, view: ViewKind) -> Option<ViewPose> {
        let b = self.boxes.selected()?;
        Some(ViewPose::new(view, &self.frames.effective(view, b), b))
    }

    pub fn control_points(&self, view: ViewKind) -> Vec<ControlPoint> {
        self.pose(view)
            .map(|pose| handles::control_points(&pose, self.view(view)))
            .unwrap_or_default()
    }

    pub fn hit_test(&self, view: ViewKind, pointer: DVec2) -> Option<ControlKind> {
        handles::hit_test(&self.control_points(view), pointer, self.settings.hit_radius_px)
    }

    // ========== Collection ==========

    /// Replace all boxes with a load result. Selects the first box.
    pub fn load(&mut self, id: &str, report: LoadReport) {
        self.cancel_interaction();
        info!("Session {}: {} boxes, {} warnings", id, report.boxes.len(), report.warnings.len());
        if !report.warnings.is_empty() {
            self.emitter.emit(LoadWarningsEvent { id: id.to_string(), warnings: report.warnings });
        }
        self.boxes.replace_all(report.boxes);
        self.modified = false;
        self.after_selection_change();
        self.emitter.emit(BoxesChangedEvent { index: None, cause: ChangeCause::Loaded });
    }

    /// Select a box. Out of range is a no-op.
    pub fn select(&mut self, index: usize) -> bool {
        if self.boxes.selected_index() == Some(index) {
            return index < self.boxes.len();
        }
        if !self.boxes.select(index) {
            return false;
        }
        self.cancel_interaction();
        self.after_selection_change();
        true
    }

    pub fn select_next(&mut self) -> Option<usize> {
        self.cancel_interaction();
        let index = self.boxes.select_next();
        self.after_selection_change();
        index
    }

    pub fn select_prev(&mut self) -> Option<usize> {
        self.cancel_interaction();
        let index = self.boxes.select_prev();
        self.after_selection_change();
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<OrientedBox> {
        let before = self.boxes.selected_index();
        self.cancel_interaction();
        let removed = self.boxes.remove(index)?;
        self.modified = true;
        self.emitter.emit(BoxesChangedEvent { index: Some(index), cause: ChangeCause::Removed });
        if before == Some(index) || self.boxes.is_empty() {
            self.after_selection_change();
        } else {
            self.mark_all_dirty();
        }
        Some(removed)
    }

    pub fn remove_selected(&mut self) -> Option<OrientedBox> {
        let index = self.boxes.selected_index()?;
        self.remove(index)
    }

    /// Append a box and select it.
    pub fn add(&mut self, b: OrientedBox) -> usize {
        let index = self.boxes.add(b);
        self.modified = true;
        self.emitter.emit(BoxesChangedEvent { index: Some(index), cause: ChangeCause::Added });
        self.select(index);
        index
    }

    /// Reset all frames to the live box and re-fit the canvases.
    pub fn align_to_axes(&mut self) {
        self.cancel_interaction();
        if let Some(b) = self.boxes.selected() {
            self.frames.sync_all(b);
        }
        self.fit_views();
        self.mark_all_dirty();
    }

    fn after_selection_change(&mut self) {
        if let Some(b) = self.boxes.selected() {
            self.frames.sync_all(b);
        }
        self.fit_views();
        self.mark_all_dirty();
        debug!("[select] {:?}", self.boxes.selected_index());
        self.emitter.emit(SelectionChangedEvent { index: self.boxes.selected_index() });
    }

    /// Zoom every 2D view so the selected box fills the target fraction.
    pub fn fit_views(&mut self) {
        let Some(size) = self.boxes.selected().map(|b| b.size()) else {
            return;
        };
        for view in ViewKind::ALL {
            let (u, v) = (size[view.u_axis().index()], size[view.v_axis().index()]);
            let i = view.index();
            self.views[i].fit(u, v, self.settings.target_occupancy);
            self.fit_pending[i] = !self.laid_out[i];
        }
    }

    fn fit_view(&mut self, view: ViewKind) {
        let Some(size) = self.boxes.selected().map(|b| b.size()) else {
            return;
        };
        let (u, v) = (size[view.u_axis().index()], size[view.v_axis().index()]);
        self.views[view.index()].fit(u, v, self.settings.target_occupancy);
    }

    /// Canvas size from layout. Empty sizes are ignored. A fit made before
    /// the first real size is redone here.
    pub fn set_canvas_size(&mut self, view: ViewKind, size: DVec2) {
        if !(size.x > 0.0 && size.y > 0.0) {
            return;
        }
        let i = view.index();
        if self.views[i].canvas != size {
            self.views[i].set_canvas(size);
            self.canvases_dirty = true;
        }
        self.laid_out[i] = true;
        if std::mem::take(&mut self.fit_pending[i]) {
            self.fit_view(view);
            self.canvases_dirty = true;
        }
    }

    // ========== Pointer input ==========

    pub fn pointer_down(&mut self, view: ViewKind, pos: DVec2, button: PointerButton) -> bool {
        match button {
            PointerButton::Secondary => {
                self.pan = Some((view, pos));
                true
            }
            PointerButton::Primary => {
                if self.drag.is_some() {
                    return false;
                }
                let Some(pose) = self.pose(view) else {
                    return false;
                };
                let Some(control) = self.hit_test(view, pos) else {
                    return false;
                };
                let Some(b) = self.boxes.selected() else {
                    return false;
                };
                let pivot = self.view(view).to_screen(pose.plane_center());
                self.frames.freeze(view, b);
                self.drag = Some(DragSession::begin(view, control, pos, b, pivot));
                self.hover = Some((view, control));
                self.canvases_dirty = true;
                true
            }
        }
    }

    pub fn pointer_move(&mut self, view: ViewKind, pos: DVec2) {
        if let Some((pan_view, last)) = self.pan {
            if pan_view == view {
                self.views[view.index()].pan_by(pos - last);
                self.pan = Some((view, pos));
                self.canvases_dirty = true;
            }
            return;
        }

        if let Some(drag) = self.drag.as_mut() {
            if drag.view != view {
                return;
            }
            let xf = &self.views[view.index()];
            let Some(b) = self.boxes.selected_mut() else {
                return;
            };
            if drag.update(pos, xf, b, self.settings.size_floor) {
                self.frames.follow_live(b);
                self.modified = true;
                self.mark_all_dirty();
            }
            return;
        }

        let hover = self.hit_test(view, pos).map(|k| (view, k));
        if hover != self.hover {
            self.hover = hover;
            self.canvases_dirty = true;
        }
    }

    pub fn pointer_up(&mut self, view: ViewKind) {
        if self.pan.is_some_and(|(v, _)| v == view) {
            self.pan = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.view == view) {
            self.end_drag();
        }
    }

    /// Leaving the canvas ends a drag exactly like releasing the button.
    pub fn pointer_leave(&mut self, view: ViewKind) {
        self.pointer_up(view);
        if self.hover.is_some_and(|(v, _)| v == view) {
            self.hover = None;
            self.canvases_dirty = true;
        }
    }

    pub fn wheel(&mut self, view: ViewKind, notches: f64, cursor: DVec2) {
        self.views[view.index()].wheel(notches, self.settings.wheel_zoom_step, cursor);
        self.canvases_dirty = true;
    }

    fn end_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if let Some(b) = self.boxes.selected() {
            self.frames.sync_all(b);
        }
        self.throttle.flush();
        self.mark_all_dirty();
        debug!("[drag] end {} {:?}", drag.view.as_str(), drag.control);
        self.emitter.emit(BoxesChangedEvent {
            index: self.boxes.selected_index(),
            cause: ChangeCause::Drag { view: drag.view, control: drag.control },
        });
    }

    /// Drop drag, pan and hover without applying anything further.
    fn cancel_interaction(&mut self) {
        if self.drag.is_some() {
            self.end_drag();
        }
        self.pan = None;
        self.hover = None;
    }

    // ========== Keyboard ==========

    /// Key-down: applies every held nudge triple. Returns true if the box moved.
    pub fn key_down(&mut self, key: EditKey) -> bool {
        let combos = self.keys.press(key);
        if combos.is_empty() || self.drag.is_some() {
            return false;
        }
        let (step, floor) = (self.settings.nudge_step, self.settings.size_floor);
        let Some(b) = self.boxes.selected_mut() else {
            return false;
        };
        for combo in &combos {
            combo.apply(b, step, floor);
        }
        debug!("[keys] applied {:?}", combos);
        self.frames.sync_all(b);
        self.modified = true;
        self.mark_all_dirty();
        self.emitter.emit(BoxesChangedEvent { index: self.boxes.selected_index(), cause: ChangeCause::Keyboard });
        true
    }

    pub fn key_up(&mut self, key: EditKey) {
        self.keys.release(key);
    }

    pub fn clear_keys(&mut self) {
        self.keys.clear();
    }

    // ========== Redraw ==========

    pub fn mark_all_dirty(&mut self) {
        self.scene_dirty = true;
        self.canvases_dirty = true;
    }

    /// Consume dirty flags. Canvas redraws are throttled during drags.
    pub fn take_redraw_at(&mut self, now: Instant) -> Redraw {
        let scene = std::mem::take(&mut self.scene_dirty);
        let canvases = if self.canvases_dirty {
            let allowed = !self.is_dragging() || self.throttle.request_at(now);
            if allowed {
                self.canvases_dirty = false;
            }
            allowed
        } else {
            self.throttle.tick_at(now)
        };
        Redraw { scene, canvases }
    }

    pub fn take_redraw(&mut self) -> Redraw {
        self.take_redraw_at(Instant::now())
    }

    /// True while a throttled canvas redraw is waiting.
    pub fn redraw_pending(&self) -> bool {
        self.canvases_dirty || self.throttle.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::{EventBus, downcast_event};
    use crate::editor::keys::{Direction, KeyMode};
    use crate::entities::transform::Axis;
    use glam::DVec3;
    use std::time::Duration;

    fn session_with(boxes: Vec<OrientedBox>) -> (EditorSession, EventBus) {
        let bus = EventBus::new();
        let mut s = EditorSession::new(EditorSettings::default(), bus.emitter());
        for view in ViewKind::ALL {
            s.set_canvas_size(view, DVec2::new(400.0, 400.0));
        }
        s.load("t", LoadReport { boxes, warnings: Vec::new() });
        (s, bus)
    }

    fn unit_scene() -> (EditorSession, EventBus) {
        session_with(vec![OrientedBox::axis_aligned("0", DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0))])
    }

    #[test]
    fn test_fit_before_layout_is_redone() {
        let bus = EventBus::new();
        let mut s = EditorSession::new(EditorSettings::default(), bus.emitter());
        s.load("t", LoadReport {
            boxes: vec![OrientedBox::axis_aligned("0", DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0))],
            warnings: Vec::new(),
        });
        s.set_canvas_size(ViewKind::Top, DVec2::new(560.0, 450.0));
        // 2 m across half of the 450 px side.
        let occupancy = 2.0 * s.view(ViewKind::Top).zoom / 450.0;
        assert!((occupancy - 0.5).abs() < 1e-9, "occupancy {}", occupancy);

        // Later resizes keep the user's zoom.
        s.wheel(ViewKind::Top, 1.0, DVec2::new(280.0, 225.0));
        let zoomed = s.view(ViewKind::Top).zoom;
        s.set_canvas_size(ViewKind::Top, DVec2::new(600.0, 500.0));
        assert_eq!(s.view(ViewKind::Top).zoom, zoomed);
    }

    #[test]
    fn test_select_fits_views() {
        let (s, _) = unit_scene();
        // Top: max(2, 1) = 2 m -> 400 * 0.5 / 2.
        assert_eq!(s.view(ViewKind::Top).zoom, 100.0);
        // Side: max(1, 1) = 1 m.
        assert_eq!(s.view(ViewKind::Side).zoom, 200.0);
        assert!(s.frames().all_match(s.selected().expect("selected")));
    }

    #[test]
    fn test_edge_drag_scenario() {
        let (mut s, _) = unit_scene();
        // Right edge midpoint of the top view.
        let start = DVec2::new(300.0, 200.0);
        assert!(s.pointer_down(ViewKind::Top, start, PointerButton::Primary));
        assert_eq!(s.drag().map(|d| d.control), Some(ControlKind::Edge(1)));
        s.pointer_move(ViewKind::Top, start + DVec2::new(50.0, 0.0));
        let b = s.selected().expect("selected");
        assert!((b.size().x - 2.5).abs() < 1e-9);
        assert!((b.center().x - 0.25).abs() < 1e-9);
        // The dragging view stays on its frozen frame.
        assert_eq!(s.effective_frame(ViewKind::Top).map(|f| f.center), Some(DVec3::ZERO));
        s.pointer_up(ViewKind::Top);
        assert!(s.drag().is_none());
        assert!(s.is_modified());
    }

    #[test]
    fn test_drag_end_resyncs_all_frames() {
        for end_by_leave in [false, true] {
            let (mut s, bus) = unit_scene();
            // Corner 2 (+x, +y) in the top view.
            let corner = DVec2::new(300.0, 150.0);
            assert!(s.pointer_down(ViewKind::Top, corner, PointerButton::Primary));
            assert!(matches!(s.drag().map(|d| d.control), Some(ControlKind::Corner(_))));
            s.pointer_move(ViewKind::Top, DVec2::new(250.0, 100.0));
            let live = s.selected().expect("selected").clone();
            assert!(!s.frames().get(ViewKind::Top).matches(&live));
            assert!(s.frames().get(ViewKind::Front).matches(&live));

            if end_by_leave {
                s.pointer_leave(ViewKind::Top);
            } else {
                s.pointer_up(ViewKind::Top);
            }
            assert!(s.frames().all_match(&live));
            assert_eq!(s.frames().frozen_view(), None);
            let events = bus.poll();
            assert!(events.iter().any(|e| downcast_event::<BoxesChangedEvent>(e)
                .is_some_and(|e| matches!(e.cause, ChangeCause::Drag { .. }))));
        }
    }

    #[test]
    fn test_pointer_miss_does_not_start_drag() {
        let (mut s, _) = unit_scene();
        assert!(!s.pointer_down(ViewKind::Front, DVec2::new(20.0, 20.0), PointerButton::Primary));
        assert!(s.drag().is_none());
        assert_eq!(s.frames().frozen_view(), None);
    }

    #[test]
    fn test_pan_and_wheel() {
        let (mut s, _) = unit_scene();
        s.pointer_down(ViewKind::Side, DVec2::new(10.0, 10.0), PointerButton::Secondary);
        s.pointer_move(ViewKind::Side, DVec2::new(30.0, 5.0));
        s.pointer_up(ViewKind::Side);
        assert_eq!(s.view(ViewKind::Side).pan, DVec2::new(20.0, -5.0));
        let zoom = s.view(ViewKind::Top).zoom;
        s.wheel(ViewKind::Top, 1.0, DVec2::new(200.0, 200.0));
        assert!((s.view(ViewKind::Top).zoom - zoom * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_keyboard_nudge() {
        let (mut s, _) = unit_scene();
        s.key_down(EditKey::Mode(KeyMode::Rotate));
        s.key_down(EditKey::Axis(Axis::Z));
        assert!(s.key_down(EditKey::Arrow(Direction::Positive)));
        assert!(s.key_down(EditKey::Arrow(Direction::Positive)));
        let z = s.selected().map(|b| b.euler_display().z).expect("selected");
        assert!((z - 0.02).abs() < 1e-12);
        s.key_up(EditKey::Mode(KeyMode::Rotate));
        assert!(!s.key_down(EditKey::Arrow(Direction::Negative)));
    }

    #[test]
    fn test_release_with_ctrl_stops_nudges() {
        let (mut s, _) = unit_scene();
        for name in ["C", "X"] {
            let (k, _) = EditKey::transition(name, true, false).expect("nudge key");
            s.key_down(k);
        }
        let (k, pressed) = EditKey::transition("C", false, true).expect("release");
        assert!(!pressed);
        s.key_up(k);
        assert!(!s.key_down(EditKey::Arrow(Direction::Positive)));
        assert_eq!(s.selected().map(|b| b.center()), Some(DVec3::ZERO));
    }

    #[test]
    fn test_remove_scenario() {
        let boxes = (0..3).map(|i| OrientedBox::axis_aligned(i.to_string(), DVec3::ZERO, DVec3::ONE)).collect();
        let (mut s, bus) = session_with(boxes);
        bus.clear();
        assert!(s.select(0));
        let removed = s.remove(0).expect("removed");
        assert_eq!(removed.obj_id, "0");
        assert_eq!(s.boxes().len(), 2);
        assert_eq!(s.selected_index(), Some(0));
        assert_eq!(s.selected().map(|b| b.obj_id.as_str()), Some("1"));
        assert!(bus.poll().iter().any(|e| downcast_event::<SelectionChangedEvent>(e).is_some()));
        assert!(s.remove(9).is_none());
        assert!(!s.select(5));
    }

    #[test]
    fn test_canvas_redraw_throttled_during_drag() {
        let (mut s, _) = unit_scene();
        let t0 = Instant::now();
        assert_eq!(s.take_redraw_at(t0), Redraw { scene: true, canvases: true });
        assert_eq!(s.take_redraw_at(t0), Redraw::default());

        s.pointer_down(ViewKind::Top, DVec2::new(200.0, 200.0), PointerButton::Primary);
        s.pointer_move(ViewKind::Top, DVec2::new(210.0, 200.0));
        assert_eq!(s.take_redraw_at(t0), Redraw { scene: true, canvases: true });
        s.pointer_move(ViewKind::Top, DVec2::new(220.0, 200.0));
        // Model and 3D view update, canvases wait for the window.
        assert_eq!(s.take_redraw_at(t0 + Duration::from_millis(5)), Redraw { scene: true, canvases: false });
        assert!(s.redraw_pending());
        assert_eq!(s.take_redraw_at(t0 + Duration::from_millis(20)).canvases, true);
        assert!((s.selected().expect("selected").center().x - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_load_emits_warnings() {
        let bus = EventBus::new();
        let mut s = EditorSession::new(EditorSettings::default(), bus.emitter());
        let report = crate::entities::annotation::parse_boxes(r#"[{"obj_id": 1}]"#).expect("parse");
        s.load("42", report);
        assert_eq!(s.selected_index(), None);
        let events = bus.poll();
        let warn = events.iter().find_map(downcast_event::<LoadWarningsEvent>).expect("warnings event");
        assert_eq!(warn.id, "42");
        assert_eq!(warn.warnings.len(), 1);
    }
}
