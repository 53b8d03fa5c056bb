//! Orbit camera for the 3D view.
//!
//! Scene coordinates are camera-sensor coordinates (x right, y down, z
//! forward), so the orbit "up" is -Y. At yaw = pitch = 0 the eye sits
//! behind the target along -Z, looking the way the sensor did.

use glam::{DMat4, DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use super::projection::{PointSprite, Segment};
use crate::entities::oriented_box::OrientedBox;
use crate::entities::point_cloud::PointCloud;
use crate::entities::transform::BOX_EDGES;

const PITCH_LIMIT: f64 = 1.5;
const MIN_DISTANCE: f64 = 0.05;
/// Framing distance as a multiple of the fit distance.
pub const FRAME_FACTOR: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitCamera {
    pub target: DVec3,
    pub distance: f64,
    pub yaw: f64,
    pub pitch: f64,
    /// Vertical field of view, radians.
    pub fov_y: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: DVec3::new(0.0, 0.0, 5.0),
            distance: 5.0,
            yaw: 0.0,
            pitch: 0.3,
            fov_y: 50f64.to_radians(),
            near: 0.01,
            far: 2000.0,
        }
    }
}

impl OrbitCamera {
    pub fn up() -> DVec3 {
        DVec3::NEG_Y
    }

    pub fn eye(&self) -> DVec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + DVec3::new(sy * cp, -sp, -cy * cp) * self.distance
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye(), self.target, Self::up())
    }

    pub fn projection_matrix(&self, aspect: f64) -> DMat4 {
        DMat4::perspective_rh_gl(self.fov_y, aspect.max(1e-6), self.near, self.far)
    }

    /// World point -> screen pixels, `None` behind the near plane.
    pub fn project(&self, world: DVec3, viewport: DVec2) -> Option<DVec2> {
        let vp = self.projection_matrix(viewport.x / viewport.y) * self.view_matrix();
        project_with(&vp, world, viewport)
    }

    /// Drag-to-orbit, radians.
    pub fn orbit(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Wheel dolly; `factor < 1` moves closer.
    pub fn dolly(&mut self, factor: f64) {
        if factor > 0.0 {
            self.distance = (self.distance * factor).clamp(MIN_DISTANCE, self.far * 0.5);
        }
    }

    /// Distance at which an object of extent `size` fills the vertical fov.
    pub fn fit_distance(&self, size: f64) -> f64 {
        (size * 0.5) / (self.fov_y * 0.5).tan()
    }

    /// Center on `b` at `FRAME_FACTOR` x its fit distance. Orientation is kept.
    pub fn frame_box(&mut self, b: &OrientedBox) {
        self.target = b.center();
        let extent = b.size().max_element();
        self.distance = (self.fit_distance(extent) * FRAME_FACTOR).max(MIN_DISTANCE);
    }

    /// Center on the cloud when there is no box to look at.
    pub fn frame_cloud(&mut self, cloud: &PointCloud) {
        if cloud.is_empty() {
            return;
        }
        let (lo, hi) = cloud.bounds();
        self.target = cloud.centroid();
        self.distance = self.fit_distance((hi - lo).max_element()).max(MIN_DISTANCE);
    }
}

fn project_with(vp: &DMat4, world: DVec3, viewport: DVec2) -> Option<DVec2> {
    let clip: DVec4 = *vp * world.extend(1.0);
    if clip.w <= 1e-9 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(DVec2::new((ndc.x + 1.0) * 0.5 * viewport.x, (1.0 - ndc.y) * 0.5 * viewport.y))
}

/// One box wireframe in the 3D view.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxWire {
    pub index: usize,
    pub selected: bool,
    pub edges: Vec<Segment>,
}

/// Screen-space content of the 3D view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene3d {
    pub points: Vec<PointSprite>,
    pub boxes: Vec<BoxWire>,
}

pub fn project_scene(
    camera: &OrbitCamera,
    cloud: Option<&PointCloud>,
    boxes: &[OrientedBox],
    selected: Option<usize>,
    viewport: DVec2,
    step: usize,
) -> Scene3d {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Scene3d::default();
    }
    let vp = camera.projection_matrix(viewport.x / viewport.y) * camera.view_matrix();
    let inside = |s: DVec2| s.cmpge(DVec2::ZERO).all() && s.cmple(viewport).all();

    let points = cloud
        .map(|c| {
            c.sampled(step)
                .filter_map(|p| project_with(&vp, p.pos, viewport).filter(|s| inside(*s)).map(|screen| PointSprite { screen, color: p.color }))
                .collect()
        })
        .unwrap_or_default();

    let boxes = boxes
        .iter()
        .enumerate()
        .map(|(index, b)| {
            let corners = b.vertices().map(|v| project_with(&vp, v, viewport));
            // Edges with an endpoint behind the camera are dropped.
            let edges = BOX_EDGES
                .iter()
                .filter_map(|(i, j)| Some(Segment { a: corners[*i]?, b: corners[*j]? }))
                .collect();
            BoxWire { index, selected: selected == Some(index), edges }
        })
        .collect();

    Scene3d { points, boxes }
}
