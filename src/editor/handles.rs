//! Control points and hit testing for the 2D views.
//!
//! Handles are computed from a `ViewPose`: the box expressed in the view's
//! effective reference frame. The painter draws from the same pose, so what
//! is under the pointer is always what gets picked.

use glam::{DMat3, DVec2, DVec3};
use log::trace;

use super::frames::ViewReferenceFrame;
use super::view::{ViewKind, ViewTransform};
use crate::entities::oriented_box::OrientedBox;
use crate::entities::transform::{self, Axis};

/// What a control point edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Translate in the view plane.
    Center,
    /// Rotate about the view's depth axis. Index into the 8 box corners.
    Corner(u8),
    /// Resize one face. 0 = bottom (v-), 1 = right (u+), 2 = top (v+), 3 = left (u-).
    Edge(u8),
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Center => "center",
            ControlKind::Corner(_) => "corner",
            ControlKind::Edge(_) => "edge",
        }
    }

    /// Pick priority, lower wins.
    fn rank(&self) -> u8 {
        match self {
            ControlKind::Edge(_) => 0,
            ControlKind::Corner(_) => 1,
            ControlKind::Center => 2,
        }
    }
}

/// The 4 box edges visible as the outline of each view, as corner pairs,
/// ordered bottom, right, top, left.
pub fn view_edges(view: ViewKind) -> [(usize, usize); 4] {
    match view {
        ViewKind::Top => [(0, 1), (1, 2), (2, 3), (3, 0)],
        ViewKind::Front => [(0, 1), (1, 5), (4, 5), (0, 4)],
        ViewKind::Side => [(0, 3), (3, 7), (4, 7), (0, 4)],
    }
}

/// Local axis and outward sign of an edge handle.
pub fn edge_axis(view: ViewKind, edge: u8) -> (Axis, f64) {
    match edge % 4 {
        0 => (view.v_axis(), -1.0),
        1 => (view.u_axis(), 1.0),
        2 => (view.v_axis(), 1.0),
        _ => (view.u_axis(), -1.0),
    }
}

/// Live box geometry in a view's reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPose {
    pub view: ViewKind,
    /// Box rotation relative to the frame.
    pub rotation: DMat3,
    /// Box center in frame coordinates.
    pub offset: DVec3,
    pub size: DVec3,
}

impl ViewPose {
    pub fn new(view: ViewKind, frame: &ViewReferenceFrame, b: &OrientedBox) -> Self {
        Self {
            view,
            rotation: frame.relative_rotation(b),
            offset: frame.to_local(b.center()),
            size: b.size(),
        }
    }

    /// Box corners in frame coordinates.
    pub fn corners(&self) -> [DVec3; 8] {
        transform::box_vertices(self.offset, self.size, self.rotation)
    }

    /// Corners projected onto the view plane.
    pub fn plane_corners(&self) -> [DVec2; 8] {
        self.corners().map(|c| self.view.to_plane(c))
    }

    pub fn plane_center(&self) -> DVec2 {
        self.view.to_plane(self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub kind: ControlKind,
    pub screen: DVec2,
}

/// All 13 handles of a view in pick order: edges, corners, center.
pub fn control_points(pose: &ViewPose, xf: &ViewTransform) -> Vec<ControlPoint> {
    let corners = pose.plane_corners().map(|p| xf.to_screen(p));
    let mut points = Vec::with_capacity(13);
    for (i, (a, b)) in view_edges(pose.view).iter().enumerate() {
        points.push(ControlPoint { kind: ControlKind::Edge(i as u8), screen: (corners[*a] + corners[*b]) * 0.5 });
    }
    for (i, c) in corners.iter().enumerate() {
        points.push(ControlPoint { kind: ControlKind::Corner(i as u8), screen: *c });
    }
    points.push(ControlPoint { kind: ControlKind::Center, screen: xf.to_screen(pose.plane_center()) });
    points
}

/// Nearest handle within `radius` pixels, edges before corners before
/// center. Within a class the closest wins.
pub fn hit_test(points: &[ControlPoint], pointer: DVec2, radius: f64) -> Option<ControlKind> {
    let r2 = radius * radius;
    let best = points
        .iter()
        .filter_map(|p| {
            let d2 = p.screen.distance_squared(pointer);
            (d2 <= r2).then_some((p.kind.rank(), d2, p.kind))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .map(|(_, _, kind)| kind);
    trace!("[pick] pointer ({:.1}, {:.1}) -> {:?}", pointer.x, pointer.y, best);
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::transform::CORNER_SIGNS;

    fn setup(view: ViewKind) -> (ViewPose, ViewTransform) {
        let b = OrientedBox::axis_aligned("a", DVec3::new(3.0, -1.0, 2.0), DVec3::new(2.0, 1.0, 0.5));
        let frame = ViewReferenceFrame::of(&b);
        let xf = ViewTransform { zoom: 100.0, pan: DVec2::ZERO, canvas: DVec2::new(400.0, 400.0) };
        (ViewPose::new(view, &frame, &b), xf)
    }

    #[test]
    fn test_edges_face_the_right_side() {
        for view in ViewKind::ALL {
            for edge in 0..4u8 {
                let (axis, sign) = edge_axis(view, edge);
                let (a, b) = view_edges(view)[edge as usize];
                // Both corners of the edge sit on the outward side of that axis.
                assert_eq!(CORNER_SIGNS[a][axis.index()], sign, "{:?} edge {}", view, edge);
                assert_eq!(CORNER_SIGNS[b][axis.index()], sign, "{:?} edge {}", view, edge);
            }
        }
    }

    #[test]
    fn test_handle_positions_top() {
        let (pose, xf) = setup(ViewKind::Top);
        let points = control_points(&pose, &xf);
        assert_eq!(points.len(), 13);
        // Right edge midpoint: +1 m along u at 100 px/m from the canvas center.
        assert_eq!(points[1].kind, ControlKind::Edge(1));
        assert!((points[1].screen - DVec2::new(300.0, 200.0)).length() < 1e-9);
        // Top edge is above the center on screen.
        assert!((points[2].screen - DVec2::new(200.0, 150.0)).length() < 1e-9);
        assert!((points[12].screen - DVec2::new(200.0, 200.0)).length() < 1e-9);
    }

    #[test]
    fn test_pick_precedence_edge_over_corner() {
        let (pose, xf) = setup(ViewKind::Front);
        let points = control_points(&pose, &xf);
        // Front: u = X (2 m), v = Z (0.5 m). Right edge midpoint (300,200),
        // corner (300,175) is 25 px away. Pointer between them, closer to the corner.
        let pointer = DVec2::new(300.0, 185.0);
        assert_eq!(hit_test(&points, pointer, 15.0), Some(ControlKind::Edge(1)));
        // Out of edge range but near the corner.
        assert!(matches!(hit_test(&points, DVec2::new(302.0, 172.0), 15.0), Some(ControlKind::Corner(_))));
    }

    #[test]
    fn test_pick_center_and_miss() {
        let (pose, xf) = setup(ViewKind::Side);
        let points = control_points(&pose, &xf);
        assert_eq!(hit_test(&points, DVec2::new(203.0, 198.0), 15.0), Some(ControlKind::Center));
        assert_eq!(hit_test(&points, DVec2::new(10.0, 10.0), 15.0), None);
    }

    #[test]
    fn test_pose_follows_offset() {
        let b = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::ONE);
        let frame = ViewReferenceFrame::of(&b);
        let mut moved = b.clone();
        moved.translate_local(Axis::Z, 0.5);
        let pose = ViewPose::new(ViewKind::Front, &frame, &moved);
        assert_eq!(pose.plane_center(), DVec2::new(0.0, 0.5));
        assert_eq!(ViewPose::new(ViewKind::Top, &frame, &moved).plane_center(), DVec2::ZERO);
    }
}
