//! Screen-space geometry for the 2D views.
//!
//! Everything here is plain data: painters in `widgets::canvas` turn it into
//! egui shapes. Points, outline and handles of one view all go through the
//! same `ViewReferenceFrame` and `ViewTransform`.

use glam::DVec2;

use crate::editor::frames::ViewReferenceFrame;
use crate::editor::handles::{ControlKind, ControlPoint, ViewPose, view_edges};
use crate::editor::view::{ViewKind, ViewTransform};
use crate::entities::point_cloud::PointCloud;
use crate::entities::transform::BOX_EDGES;

/// Grid spacing in metres.
pub const GRID_SPACING: f64 = 1.0;
/// Cap on grid lines per direction; coarser zoom levels skip the grid.
const MAX_GRID_LINES: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSprite {
    pub screen: DVec2,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
}

/// Outline of the box in one view.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxOutline {
    /// All 12 box edges.
    pub edges: Vec<Segment>,
    /// The 4 edges carrying resize handles, bottom/right/top/left.
    pub silhouette: [Segment; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleMark {
    pub kind: ControlKind,
    pub screen: DVec2,
    pub hovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLineKind {
    Minor,
    /// Passes through the view origin.
    Axis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub segment: Segment,
    pub kind: GridLineKind,
}

/// Lower depth bound of points kept in a view: the far face pushed back by
/// `ratio` of the box depth.
pub fn depth_cutoff(view: ViewKind, frame: &ViewReferenceFrame, ratio: f64) -> f64 {
    let depth = frame.size[view.depth_axis().index()];
    -(depth * 0.5) - depth * ratio
}

/// Cloud points in front of the depth cutoff, every `step`-th point.
pub fn project_cloud(
    view: ViewKind,
    frame: &ViewReferenceFrame,
    cloud: &PointCloud,
    xf: &ViewTransform,
    step: usize,
    depth_ratio: f64,
) -> Vec<PointSprite> {
    let cutoff = depth_cutoff(view, frame, depth_ratio);
    let (lo, hi) = (DVec2::ZERO, xf.canvas);
    cloud
        .sampled(step)
        .filter_map(|p| {
            let local = frame.to_local(p.pos);
            if view.depth_of(local) <= cutoff {
                return None;
            }
            let screen = xf.to_screen(view.to_plane(local));
            let visible = screen.cmpge(lo).all() && screen.cmple(hi).all();
            visible.then_some(PointSprite { screen, color: p.color })
        })
        .collect()
}

pub fn box_outline(pose: &ViewPose, xf: &ViewTransform) -> BoxOutline {
    let corners = pose.plane_corners().map(|p| xf.to_screen(p));
    let seg = |(i, j): (usize, usize)| Segment { a: corners[i], b: corners[j] };
    BoxOutline {
        edges: BOX_EDGES.iter().map(|e| seg(*e)).collect(),
        silhouette: view_edges(pose.view).map(seg),
    }
}

pub fn handle_marks(points: &[ControlPoint], hover: Option<ControlKind>) -> Vec<HandleMark> {
    points
        .iter()
        .map(|p| HandleMark { kind: p.kind, screen: p.screen, hovered: hover == Some(p.kind) })
        .collect()
}

/// Grid lines every `spacing` metres covering the canvas.
pub fn grid_lines(xf: &ViewTransform, spacing: f64) -> Vec<GridLine> {
    if !(spacing > 0.0) {
        return Vec::new();
    }
    let top_left = xf.to_plane(DVec2::ZERO);
    let bottom_right = xf.to_plane(xf.canvas);
    let (u0, u1) = (top_left.x.min(bottom_right.x), top_left.x.max(bottom_right.x));
    let (v0, v1) = (top_left.y.min(bottom_right.y), top_left.y.max(bottom_right.y));
    if (u1 - u0) / spacing > MAX_GRID_LINES || (v1 - v0) / spacing > MAX_GRID_LINES {
        return axis_lines(xf);
    }

    let mut lines = Vec::new();
    let kind_of = |i: i64| if i == 0 { GridLineKind::Axis } else { GridLineKind::Minor };
    for i in (u0 / spacing).ceil() as i64..=(u1 / spacing).floor() as i64 {
        let u = i as f64 * spacing;
        lines.push(GridLine {
            segment: Segment { a: xf.to_screen(DVec2::new(u, v0)), b: xf.to_screen(DVec2::new(u, v1)) },
            kind: kind_of(i),
        });
    }
    for i in (v0 / spacing).ceil() as i64..=(v1 / spacing).floor() as i64 {
        let v = i as f64 * spacing;
        lines.push(GridLine {
            segment: Segment { a: xf.to_screen(DVec2::new(u0, v)), b: xf.to_screen(DVec2::new(u1, v)) },
            kind: kind_of(i),
        });
    }
    lines
}

fn axis_lines(xf: &ViewTransform) -> Vec<GridLine> {
    let o = xf.origin();
    vec![
        GridLine { segment: Segment { a: DVec2::new(o.x, 0.0), b: DVec2::new(o.x, xf.canvas.y) }, kind: GridLineKind::Axis },
        GridLine { segment: Segment { a: DVec2::new(0.0, o.y), b: DVec2::new(xf.canvas.x, o.y) }, kind: GridLineKind::Axis },
    ]
}
