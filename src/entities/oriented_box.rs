//! OrientedBox - authoritative per-object box state.
//!
//! Orientation lives in exactly one place: the rotation matrix. The Euler
//! triple is a display mirror recomputed after every mutation and never
//! written back. Sizes are clamped to a positive floor on every edit.

use std::fmt;

use glam::{DMat3, DMat4, DVec3};
use serde_json::{Map, Value};

use super::transform::{self, Axis};

/// Smallest allowed extent along any local axis.
pub const MIN_SIZE: f64 = 0.01;

/// Cosine above which two reconstructed edges count as non-orthogonal.
const SKEW_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct OrientedBox {
    pub obj_id: String,
    pub category: String,
    center: DVec3,
    size: DVec3,
    rotation: DMat3,
    euler: DVec3,
    /// Unrecognized fields of the persisted entry, written back on save.
    pub extras: Map<String, Value>,
}

impl OrientedBox {
    pub fn new(obj_id: impl Into<String>, category: impl Into<String>, center: DVec3, size: DVec3, rotation: DMat3) -> Self {
        let mut b = Self {
            obj_id: obj_id.into(),
            category: category.into(),
            center,
            size: clamp_size(size, MIN_SIZE),
            rotation,
            euler: DVec3::ZERO,
            extras: Map::new(),
        };
        b.refresh_euler();
        b
    }

    /// Axis-aligned box, mostly for tests and "add box" in the UI.
    pub fn axis_aligned(obj_id: impl Into<String>, center: DVec3, size: DVec3) -> Self {
        Self::new(obj_id, "object", center, size, DMat3::IDENTITY)
    }

    // ========== Accessors ==========

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn size(&self) -> DVec3 {
        self.size
    }

    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    /// Euler angles `[x, y, z]` (ZYX order). Display only.
    pub fn euler_display(&self) -> DVec3 {
        self.euler
    }

    pub fn vertices(&self) -> [DVec3; 8] {
        transform::box_vertices(self.center, self.size, self.rotation)
    }

    pub fn model_matrix(&self) -> DMat4 {
        transform::model_matrix(self.center, self.rotation)
    }

    /// World point -> box-local coordinates.
    pub fn to_local(&self, world: DVec3) -> DVec3 {
        self.rotation.transpose() * (world - self.center)
    }

    /// World-space direction of a local axis.
    pub fn local_axis(&self, axis: Axis) -> DVec3 {
        self.rotation.col(axis.index())
    }

    // ========== Setters (drag interpreter) ==========

    pub fn set_center(&mut self, center: DVec3) {
        self.center = center;
    }

    pub fn set_size(&mut self, size: DVec3, floor: f64) {
        self.size = clamp_size(size, floor);
    }

    /// Replace the rotation. Callers pass compositions of rotations, small
    /// float drift is folded back by re-orthonormalizing.
    pub fn set_rotation(&mut self, rotation: DMat3) {
        self.rotation = if transform::orthonormality_error(&rotation) > 1e-9 {
            transform::reorthonormalize(&rotation)
        } else {
            rotation
        };
        self.refresh_euler();
    }

    /// Copy geometry from another box (identity and extras untouched).
    pub fn set_geometry(&mut self, center: DVec3, size: DVec3, rotation: DMat3) {
        self.center = center;
        self.size = clamp_size(size, MIN_SIZE);
        self.set_rotation(rotation);
    }

    // ========== Local-axis edits ==========

    /// Move along the box's own axis.
    pub fn translate_local(&mut self, axis: Axis, amount: f64) {
        self.center += self.rotation * (axis.unit() * amount);
    }

    /// Rotate about the box's own (already rotated) axis: `R = R * dR`.
    pub fn rotate_local(&mut self, axis: Axis, radians: f64) {
        let r = self.rotation * transform::axis_rotation(axis, radians);
        self.set_rotation(r);
    }

    /// Grow or shrink one extent symmetrically about the center.
    pub fn resize_local(&mut self, axis: Axis, amount: f64) {
        self.resize_local_with_floor(axis, amount, MIN_SIZE);
    }

    pub fn resize_local_with_floor(&mut self, axis: Axis, amount: f64, floor: f64) {
        let mut s = self.size.to_array();
        s[axis.index()] += amount;
        self.size = clamp_size(DVec3::from(s), floor);
    }

    fn refresh_euler(&mut self) {
        self.euler = transform::euler_zyx_from_matrix(&self.rotation);
    }

    // ========== Reconstruction ==========

    /// Rebuild geometry from 8 corners in canonical order.
    ///
    /// Axes come from `v1-v0`, `v3-v0`, `v4-v0`, center is the corner mean.
    /// Skewed or left-handed input is orthonormalized and reported in
    /// `Reconstruction::issues`; collapsed edges are rejected.
    pub fn reconstruct(vertices: &[DVec3]) -> Result<Reconstruction, GeometryError> {
        if vertices.len() != 8 {
            return Err(GeometryError::WrongVertexCount(vertices.len()));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite);
        }

        let ex = vertices[1] - vertices[0];
        let ey = vertices[3] - vertices[0];
        let ez = vertices[4] - vertices[0];
        let size = DVec3::new(ex.length(), ey.length(), ez.length());
        for axis in Axis::ALL {
            if size[axis.index()] < f64::EPSILON * 1e3 {
                return Err(GeometryError::ZeroLengthEdge(axis));
            }
        }

        let center = vertices.iter().copied().sum::<DVec3>() / 8.0;

        let mut issues = Vec::new();
        let (nx, ny, nz) = (ex / size.x, ey / size.y, ez / size.z);
        let skew = nx.dot(ny).abs().max(nx.dot(nz).abs()).max(ny.dot(nz).abs());
        if skew > SKEW_TOLERANCE {
            issues.push(GeometryIssue::Skewed { max_cosine: skew });
        }
        if nx.cross(ny).dot(nz) < 0.0 {
            issues.push(GeometryIssue::LeftHanded);
        }

        let rotation = transform::orthonormal_basis(ex, ey).ok_or(GeometryError::ZeroLengthEdge(Axis::Y))?;
        Ok(Reconstruction { center, size, rotation, issues })
    }

    pub fn from_vertices(obj_id: impl Into<String>, category: impl Into<String>, vertices: &[DVec3]) -> Result<(Self, Vec<GeometryIssue>), GeometryError> {
        let r = Self::reconstruct(vertices)?;
        Ok((Self::new(obj_id, category, r.center, r.size, r.rotation), r.issues))
    }
}

fn clamp_size(size: DVec3, floor: f64) -> DVec3 {
    let floor = floor.max(f64::EPSILON);
    let fix = |v: f64| if v.is_finite() { v.max(floor) } else { floor };
    DVec3::new(fix(size.x), fix(size.y), fix(size.z))
}

/// Geometry recovered from 8 corners.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub center: DVec3,
    pub size: DVec3,
    pub rotation: DMat3,
    pub issues: Vec<GeometryIssue>,
}

/// Recoverable oddities found while reconstructing.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryIssue {
    Skewed { max_cosine: f64 },
    LeftHanded,
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryIssue::Skewed { max_cosine } => {
                write!(f, "edges not orthogonal (max cos {:.4}), orthonormalized", max_cosine)
            }
            GeometryIssue::LeftHanded => write!(f, "corner order is left-handed, z axis rebuilt as x cross y"),
        }
    }
}

/// Reasons a persisted box cannot be used at all.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    WrongVertexCount(usize),
    NonFinite,
    ZeroLengthEdge(Axis),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::WrongVertexCount(n) => write!(f, "expected 8 vertices, got {}", n),
            GeometryError::NonFinite => write!(f, "vertex coordinates are not finite"),
            GeometryError::ZeroLengthEdge(axis) => write!(f, "zero-length edge along local {}", axis.as_str()),
        }
    }
}

impl std::error::Error for GeometryError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::transform::{matrix_from_euler_zyx, orthonormality_error};
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < EPS
    }

    fn sample_box() -> OrientedBox {
        OrientedBox::new(
            "7",
            "car",
            DVec3::new(1.5, -2.0, 12.0),
            DVec3::new(4.2, 1.8, 1.6),
            matrix_from_euler_zyx(DVec3::new(0.2, -0.4, 1.3)),
        )
    }

    #[test]
    fn test_vertices_roundtrip() {
        let b = sample_box();
        let r = OrientedBox::reconstruct(&b.vertices()).expect("valid corners");
        assert!(approx(r.center, b.center()));
        assert!(approx(r.size, b.size()));
        assert!(orthonormality_error(&(r.rotation.transpose() * b.rotation())) < 1e-9);
        assert!((r.rotation.x_axis - b.rotation().x_axis).length() < EPS);
        assert!((r.rotation.z_axis - b.rotation().z_axis).length() < EPS);
        assert!(r.issues.is_empty());
    }

    #[test]
    fn test_rotate_local_stays_orthonormal() {
        let mut b = sample_box();
        let axes = [Axis::X, Axis::Y, Axis::Z];
        for i in 0..5000 {
            b.rotate_local(axes[i % 3], 0.013 * (i as f64).sin() + 0.007);
        }
        assert!(orthonormality_error(&b.rotation()) < 1e-9);
        assert!((b.rotation().determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let mut b = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::ONE);
        b.rotate_local(Axis::Z, FRAC_PI_2);
        assert!(approx(b.local_axis(Axis::X), DVec3::Y));
        assert!((b.euler_display().z - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_rotate_local_composes_on_the_right() {
        let mut b = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::ONE);
        b.rotate_local(Axis::Z, FRAC_PI_2);
        // Local X is now world Y; rotating about local X turns local Y (world -X) toward world Z.
        b.rotate_local(Axis::X, FRAC_PI_2);
        assert!(approx(b.local_axis(Axis::X), DVec3::Y));
        assert!(approx(b.local_axis(Axis::Y), DVec3::Z));
    }

    #[test]
    fn test_translate_local_follows_rotation() {
        let mut b = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::ONE);
        b.rotate_local(Axis::Z, FRAC_PI_2);
        b.translate_local(Axis::X, 2.0);
        assert!(approx(b.center(), DVec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_resize_clamps_to_floor() {
        let mut b = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::new(1.0, 1.0, 1.0));
        b.resize_local(Axis::Y, -5.0);
        assert!((b.size().y - MIN_SIZE).abs() < EPS);
        b.resize_local(Axis::Y, 0.5);
        assert!((b.size().y - (MIN_SIZE + 0.5)).abs() < EPS);
        b.resize_local_with_floor(Axis::X, -0.99, 0.05);
        assert!((b.size().x - 0.05).abs() < EPS);
    }

    #[test]
    fn test_reconstruct_rejects_bad_input() {
        let b = sample_box();
        let v = b.vertices();
        assert_eq!(OrientedBox::reconstruct(&v[..7]).unwrap_err(), GeometryError::WrongVertexCount(7));

        let mut flat = v;
        flat[3] = flat[0];
        assert!(matches!(OrientedBox::reconstruct(&flat), Err(GeometryError::ZeroLengthEdge(Axis::Y))));

        let mut nan = v;
        nan[5].x = f64::NAN;
        assert_eq!(OrientedBox::reconstruct(&nan).unwrap_err(), GeometryError::NonFinite);
    }

    #[test]
    fn test_reconstruct_skewed_is_orthonormalized() {
        let mut v = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0)).vertices();
        v[3] += DVec3::new(0.1, 0.0, 0.0);
        let r = OrientedBox::reconstruct(&v).expect("recoverable");
        assert!(r.issues.iter().any(|i| matches!(i, GeometryIssue::Skewed { .. })));
        assert!(orthonormality_error(&r.rotation) < EPS);
    }

    #[test]
    fn test_reconstruct_left_handed() {
        let b = OrientedBox::axis_aligned("a", DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0));
        let v = b.vertices();
        // Swap the -Z and +Z faces.
        let mirrored = [v[4], v[5], v[6], v[7], v[0], v[1], v[2], v[3]];
        let r = OrientedBox::reconstruct(&mirrored).expect("recoverable");
        assert!(r.issues.contains(&GeometryIssue::LeftHanded));
        assert!((r.rotation.determinant() - 1.0).abs() < EPS);
    }
}
