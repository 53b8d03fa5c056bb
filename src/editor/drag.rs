//! Drag interpreter: pointer motion in one 2D view -> box update.
//!
//! Every update is computed from the box state captured at drag start, never
//! from the previous frame, so long drags do not accumulate error.
//!
//! - Center: pixel delta becomes a plane delta, read as a local
//!   displacement (depth pinned to 0), rotated into world space.
//! - Edge: the face under the pointer moves, the opposite face stays. Size
//!   changes by the delta along the edge normal (clamped to the floor) and
//!   the center shifts by half of the applied change.
//! - Corner: the pointer angle around the box center is tracked and the
//!   accumulated angle is applied as `R = R0 * rot(depth, handedness * a)`.

use std::f64::consts::{PI, TAU};

use glam::{DMat3, DVec2};
use log::debug;

use super::frames::ViewReferenceFrame;
use super::handles::{ControlKind, edge_axis};
use super::view::{ViewKind, ViewTransform};
use crate::entities::oriented_box::OrientedBox;
use crate::entities::transform;

/// Pointer closer than this to the pivot gives no usable angle.
const MIN_PIVOT_DISTANCE_PX: f64 = 1.0;

/// Transient state between pointer-down on a handle and release.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub view: ViewKind,
    pub control: ControlKind,
    pub start_pointer: DVec2,
    /// Box state at drag start (also the frozen frame of `view`).
    pub start: ViewReferenceFrame,
    /// Screen position rotation angles are measured around.
    pub pivot: DVec2,
    last_angle: f64,
    /// Signed screen angle since drag start, counter-clockwise positive.
    pub angle_accumulator: f64,
}

impl DragSession {
    pub fn begin(view: ViewKind, control: ControlKind, pointer: DVec2, b: &OrientedBox, pivot: DVec2) -> Self {
        let last_angle = screen_angle(pivot, pointer).unwrap_or(0.0);
        debug!("[drag] begin {} {:?} at ({:.1}, {:.1})", view.as_str(), control, pointer.x, pointer.y);
        Self {
            view,
            control,
            start_pointer: pointer,
            start: ViewReferenceFrame::of(b),
            pivot,
            last_angle,
            angle_accumulator: 0.0,
        }
    }

    /// Apply pointer position `pointer` to `b`. Returns true if `b` changed.
    pub fn update(&mut self, pointer: DVec2, xf: &ViewTransform, b: &mut OrientedBox, size_floor: f64) -> bool {
        match self.control {
            ControlKind::Center => {
                let local = self.view.plane_to_local(xf.delta_to_plane(pointer - self.start_pointer));
                b.set_center(self.start.center + self.start.rotation * local);
                true
            }
            ControlKind::Edge(edge) => {
                let local = self.view.plane_to_local(xf.delta_to_plane(pointer - self.start_pointer));
                let (axis, sign) = edge_axis(self.view, edge);
                let i = axis.index();
                let old = self.start.size[i];
                let new = (old + sign * local[i]).max(size_floor);
                let applied = new - old;

                let mut size = self.start.size;
                size[i] = new;
                b.set_size(size, size_floor);
                b.set_center(self.start.center + self.start.rotation * (axis.unit() * (sign * applied * 0.5)));
                true
            }
            ControlKind::Corner(_) => {
                let Some(angle) = screen_angle(self.pivot, pointer) else {
                    return false;
                };
                self.angle_accumulator += wrap_angle(angle - self.last_angle);
                self.last_angle = angle;
                b.set_rotation(self.start.rotation * self.rotation_delta());
                true
            }
        }
    }

    /// Local rotation applied so far by a corner drag.
    pub fn rotation_delta(&self) -> DMat3 {
        transform::axis_rotation(self.view.depth_axis(), self.view.handedness() * self.angle_accumulator)
    }

    pub fn is_rotation(&self) -> bool {
        matches!(self.control, ControlKind::Corner(_))
    }
}

/// Counter-clockwise screen angle of `p` around `pivot` (screen y down).
fn screen_angle(pivot: DVec2, p: DVec2) -> Option<f64> {
    let d = p - pivot;
    if d.length() < MIN_PIVOT_DISTANCE_PX {
        return None;
    }
    Some((-d.y).atan2(d.x))
}

/// Wrap to (-pi, pi].
fn wrap_angle(a: f64) -> f64 {
    let mut a = a % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}
