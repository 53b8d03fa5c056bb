//! Colored point cloud buffer.

use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudPoint {
    pub pos: DVec3,
    /// Linear RGB in 0..1.
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    points: Vec<CloudPoint>,
    min: DVec3,
    max: DVec3,
}

impl PointCloud {
    pub fn new(points: Vec<CloudPoint>) -> Self {
        let mut cloud = Self { points, min: DVec3::ZERO, max: DVec3::ZERO };
        cloud.recompute_bounds();
        cloud
    }

    fn recompute_bounds(&mut self) {
        let mut it = self.points.iter();
        let Some(first) = it.next() else {
            self.min = DVec3::ZERO;
            self.max = DVec3::ZERO;
            return;
        };
        let (mut lo, mut hi) = (first.pos, first.pos);
        for p in it {
            lo = lo.min(p.pos);
            hi = hi.max(p.pos);
        }
        self.min = lo;
        self.max = hi;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CloudPoint] {
        &self.points
    }

    pub fn bounds(&self) -> (DVec3, DVec3) {
        (self.min, self.max)
    }

    pub fn centroid(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points.iter().map(|p| p.pos).sum::<DVec3>() / self.points.len() as f64
    }

    /// Drop points farther than `max_depth` along camera Z (sensor noise).
    /// Returns the number removed.
    pub fn retain_depth(&mut self, max_depth: f64) -> usize {
        let before = self.points.len();
        self.points.retain(|p| p.pos.z.abs() <= max_depth && p.pos.is_finite());
        self.recompute_bounds();
        before - self.points.len()
    }

    /// Every `step`-th point (step 0 is treated as 1).
    pub fn sampled(&self, step: usize) -> impl Iterator<Item = &CloudPoint> {
        self.points.iter().step_by(step.max(1))
    }
}
