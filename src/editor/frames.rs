//! Per-view reference frames.
//!
//! A 2D view draws the cloud and the box in the local frame of some box
//! state. Normally that is the live box. While a drag runs in a view, that
//! view switches to the frame captured at drag start so the cloud stays put
//! and only the box moves under the pointer; the other views keep
//! following the live box. Drag end resyncs all frames to the live state.

use glam::{DMat3, DVec3};

use super::view::ViewKind;
use crate::entities::oriented_box::OrientedBox;

/// Snapshot of the box geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewReferenceFrame {
    pub rotation: DMat3,
    pub center: DVec3,
    pub size: DVec3,
}

impl Default for ViewReferenceFrame {
    fn default() -> Self {
        Self { rotation: DMat3::IDENTITY, center: DVec3::ZERO, size: DVec3::ONE }
    }
}

impl ViewReferenceFrame {
    pub fn of(b: &OrientedBox) -> Self {
        Self { rotation: b.rotation(), center: b.center(), size: b.size() }
    }

    /// World point -> frame-local coordinates.
    pub fn to_local(&self, world: DVec3) -> DVec3 {
        self.rotation.transpose() * (world - self.center)
    }

    /// Rotation of `b` relative to this frame.
    pub fn relative_rotation(&self, b: &OrientedBox) -> DMat3 {
        self.rotation.transpose() * b.rotation()
    }

    pub fn matches(&self, b: &OrientedBox) -> bool {
        *self == Self::of(b)
    }
}

/// One frame per 2D view, indexed by `ViewKind`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFrames {
    frames: [ViewReferenceFrame; 3],
    /// View whose frame is frozen by an active drag.
    frozen: Option<ViewKind>,
}

impl ReferenceFrames {
    pub fn get(&self, view: ViewKind) -> &ViewReferenceFrame {
        &self.frames[view.index()]
    }

    pub fn frozen_view(&self) -> Option<ViewKind> {
        self.frozen
    }

    /// Snapshot `b` into `view` and freeze it (drag start).
    pub fn freeze(&mut self, view: ViewKind, b: &OrientedBox) {
        self.frames[view.index()] = ViewReferenceFrame::of(b);
        self.frozen = Some(view);
    }

    /// Refresh every view except the frozen one from the live box.
    pub fn follow_live(&mut self, b: &OrientedBox) {
        for view in ViewKind::ALL {
            if self.frozen != Some(view) {
                self.frames[view.index()] = ViewReferenceFrame::of(b);
            }
        }
    }

    /// Unfreeze and reset all three frames to the live box.
    pub fn sync_all(&mut self, b: &OrientedBox) {
        self.frozen = None;
        self.frames = [ViewReferenceFrame::of(b); 3];
    }

    /// Frame a view should draw with right now.
    pub fn effective(&self, view: ViewKind, live: &OrientedBox) -> ViewReferenceFrame {
        if self.frozen == Some(view) { *self.get(view) } else { ViewReferenceFrame::of(live) }
    }

    pub fn all_match(&self, b: &OrientedBox) -> bool {
        self.frames.iter().all(|f| f.matches(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::transform::Axis;

    #[test]
    fn test_freeze_then_sync() {
        let mut b = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0));
        let mut frames = ReferenceFrames::default();
        frames.sync_all(&b);
        frames.freeze(ViewKind::Front, &b);

        b.rotate_local(Axis::Y, 0.3);
        b.translate_local(Axis::X, 1.0);
        frames.follow_live(&b);

        assert!(!frames.get(ViewKind::Front).matches(&b));
        assert!(frames.get(ViewKind::Top).matches(&b));
        assert_eq!(frames.effective(ViewKind::Front, &b).center, DVec3::ZERO);
        assert_eq!(frames.effective(ViewKind::Side, &b).center, b.center());

        frames.sync_all(&b);
        assert!(frames.all_match(&b));
        assert_eq!(frames.frozen_view(), None);
    }

    #[test]
    fn test_frame_local() {
        let mut b = OrientedBox::axis_aligned("a", DVec3::new(1.0, 0.0, 0.0), DVec3::ONE);
        b.rotate_local(Axis::Z, std::f64::consts::FRAC_PI_2);
        let f = ViewReferenceFrame::of(&b);
        let local = f.to_local(DVec3::new(1.0, 1.0, 0.0));
        assert!((local - DVec3::X).length() < 1e-12);
        assert!(f.relative_rotation(&b).abs_diff_eq(DMat3::IDENTITY, 1e-12));
    }
}
