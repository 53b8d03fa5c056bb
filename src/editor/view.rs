//! Orthographic 2D views and their screen mapping.
//!
//! Every 2D view looks at the box along one of its own local axes:
//!
//! | view  | screen u | screen v | depth |
//! |-------|----------|----------|-------|
//! | Top   | X        | Y        | Z     |
//! | Front | X        | Z        | Y     |
//! | Side  | Y        | Z        | X     |
//!
//! Screen mapping: `sx = cx + pan.x + u * zoom`, `sy = cy + pan.y - v * zoom`
//! (v grows upward, screen y grows downward).

use glam::{DVec2, DVec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::entities::transform::Axis;

/// Zoom limits in pixels per metre.
const MIN_ZOOM: f64 = 0.01;
const MAX_ZOOM: f64 = 1.0e5;

/// Canvas size assumed before the first layout pass.
const DEFAULT_CANVAS: DVec2 = DVec2::new(400.0, 400.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ViewKind {
    Top,
    Front,
    Side,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Top, ViewKind::Front, ViewKind::Side];

    pub fn index(self) -> usize {
        match self {
            ViewKind::Top => 0,
            ViewKind::Front => 1,
            ViewKind::Side => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Top => "top",
            ViewKind::Front => "front",
            ViewKind::Side => "side",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ViewKind::Top => "Top (XY)",
            ViewKind::Front => "Front (XZ)",
            ViewKind::Side => "Side (YZ)",
        }
    }

    /// Local axis drawn along screen u (rightward).
    pub fn u_axis(self) -> Axis {
        match self {
            ViewKind::Top | ViewKind::Front => Axis::X,
            ViewKind::Side => Axis::Y,
        }
    }

    /// Local axis drawn along screen v (upward).
    pub fn v_axis(self) -> Axis {
        match self {
            ViewKind::Top => Axis::Y,
            ViewKind::Front | ViewKind::Side => Axis::Z,
        }
    }

    /// Local axis perpendicular to the screen.
    pub fn depth_axis(self) -> Axis {
        match self {
            ViewKind::Top => Axis::Z,
            ViewKind::Front => Axis::Y,
            ViewKind::Side => Axis::X,
        }
    }

    /// Projection handedness: `sign((u x v) . depth)`.
    ///
    /// A counter-clockwise turn on screen is a rotation of
    /// `handedness * angle` about the depth axis. Front maps to -1 because
    /// X x Z = -Y. Drag rotation and 2D display both go through here.
    pub fn handedness(self) -> f64 {
        let n = self.u_axis().unit().cross(self.v_axis().unit());
        n.dot(self.depth_axis().unit()).signum()
    }

    /// Plane coordinates of a local point.
    pub fn to_plane(self, local: DVec3) -> DVec2 {
        DVec2::new(local[self.u_axis().index()], local[self.v_axis().index()])
    }

    /// Local displacement for a plane displacement; depth stays 0.
    pub fn plane_to_local(self, d: DVec2) -> DVec3 {
        let mut v = DVec3::ZERO;
        v[self.u_axis().index()] = d.x;
        v[self.v_axis().index()] = d.y;
        v
    }

    pub fn depth_of(self, local: DVec3) -> f64 {
        local[self.depth_axis().index()]
    }
}

/// Per-view pan/zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    /// Pixels per metre.
    pub zoom: f64,
    /// Pixel offset of the plane origin from the canvas center.
    pub pan: DVec2,
    pub canvas: DVec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { zoom: 100.0, pan: DVec2::ZERO, canvas: DEFAULT_CANVAS }
    }
}

impl ViewTransform {
    pub fn origin(&self) -> DVec2 {
        self.canvas * 0.5 + self.pan
    }

    pub fn to_screen(&self, plane: DVec2) -> DVec2 {
        let o = self.origin();
        DVec2::new(o.x + plane.x * self.zoom, o.y - plane.y * self.zoom)
    }

    pub fn to_plane(&self, screen: DVec2) -> DVec2 {
        let o = self.origin();
        DVec2::new((screen.x - o.x) / self.zoom, -(screen.y - o.y) / self.zoom)
    }

    /// Pixel delta -> plane delta (y flipped).
    pub fn delta_to_plane(&self, px: DVec2) -> DVec2 {
        DVec2::new(px.x / self.zoom, -px.y / self.zoom)
    }

    pub fn set_canvas(&mut self, size: DVec2) {
        if size.x > 0.0 && size.y > 0.0 {
            self.canvas = size;
        }
    }

    /// Zoom so an extent of `u_size` x `v_size` fills `occupancy` of the
    /// shorter canvas side; pan resets.
    pub fn fit(&mut self, u_size: f64, v_size: f64, occupancy: f64) {
        let extent = u_size.max(v_size);
        if !(extent > 0.0) {
            return;
        }
        let side = self.canvas.x.min(self.canvas.y);
        self.zoom = (side * occupancy / extent).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = DVec2::ZERO;
    }

    /// Wheel zoom keeping the plane point under `cursor` fixed.
    /// `notches > 0` zooms in.
    pub fn wheel(&mut self, notches: f64, step: f64, cursor: DVec2) {
        if notches.abs() < 1e-6 {
            return;
        }
        let anchor = self.to_plane(cursor);
        let factor = if notches > 0.0 { 1.0 + step } else { 1.0 - step };
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        // Re-pin anchor under the cursor.
        let moved = self.to_screen(anchor);
        self.pan += cursor - moved;
        debug!("[view] zoom {:.2} pan ({:.1}, {:.1})", self.zoom, self.pan.x, self.pan.y);
    }

    pub fn pan_by(&mut self, px: DVec2) {
        self.pan += px;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handedness() {
        assert_eq!(ViewKind::Top.handedness(), 1.0);
        assert_eq!(ViewKind::Front.handedness(), -1.0);
        assert_eq!(ViewKind::Side.handedness(), 1.0);
    }

    #[test]
    fn test_axes_are_distinct() {
        for v in ViewKind::ALL {
            let axes = [v.u_axis(), v.v_axis(), v.depth_axis()];
            assert_ne!(axes[0], axes[1]);
            assert_ne!(axes[1], axes[2]);
            assert_ne!(axes[0], axes[2]);
        }
    }

    #[test]
    fn test_plane_mapping() {
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(ViewKind::Top.to_plane(p), DVec2::new(1.0, 2.0));
        assert_eq!(ViewKind::Front.to_plane(p), DVec2::new(1.0, 3.0));
        assert_eq!(ViewKind::Side.to_plane(p), DVec2::new(2.0, 3.0));
        assert_eq!(ViewKind::Front.plane_to_local(DVec2::new(4.0, 5.0)), DVec3::new(4.0, 0.0, 5.0));
        assert_eq!(ViewKind::Side.depth_of(p), 1.0);
    }

    #[test]
    fn test_screen_roundtrip_and_flip() {
        let t = ViewTransform { zoom: 50.0, pan: DVec2::new(10.0, -4.0), canvas: DVec2::new(400.0, 300.0) };
        let s = t.to_screen(DVec2::new(1.0, 1.0));
        assert_eq!(s, DVec2::new(200.0 + 10.0 + 50.0, 150.0 - 4.0 - 50.0));
        assert!((t.to_plane(s) - DVec2::new(1.0, 1.0)).length() < 1e-12);
        assert_eq!(t.delta_to_plane(DVec2::new(50.0, 50.0)), DVec2::new(1.0, -1.0));
    }

    #[test]
    fn test_fit() {
        let mut t = ViewTransform { canvas: DVec2::new(800.0, 400.0), pan: DVec2::new(5.0, 5.0), ..Default::default() };
        t.fit(2.0, 1.0, 0.5);
        assert_eq!(t.zoom, 100.0);
        assert_eq!(t.pan, DVec2::ZERO);
    }

    #[test]
    fn test_wheel_keeps_anchor() {
        let mut t = ViewTransform::default();
        let cursor = DVec2::new(300.0, 120.0);
        let before = t.to_plane(cursor);
        t.wheel(1.0, 0.1, cursor);
        assert!((t.zoom - 110.0).abs() < 1e-9);
        assert!((t.to_plane(cursor) - before).length() < 1e-9);
        t.wheel(-1.0, 0.1, cursor);
        assert!((t.zoom - 99.0).abs() < 1e-9);
    }
}
