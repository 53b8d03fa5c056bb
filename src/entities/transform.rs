//! Geometry kernel for oriented boxes.
//!
//! All math is f64 (glam `D*` types) in a right-handed world frame.
//! Rotation convention: Euler ZYX, i.e. `R = Rz(z) * Ry(y) * Rx(x)`
//! (rotate about world X first, then Y, then Z).
//!
//! Canonical corner order (local half extents `h`):
//! ```text
//! v0 (-x,-y,-z)  v1 (+x,-y,-z)  v2 (+x,+y,-z)  v3 (-x,+y,-z)
//! v4 (-x,-y,+z)  v5 (+x,-y,+z)  v6 (+x,+y,+z)  v7 (-x,+y,+z)
//! ```
//! Edge, face and handle tables elsewhere index into this order, so it
//! must never change.

use glam::{DMat3, DMat4, DVec3, EulerRot};

/// Corner sign pattern in canonical order.
pub const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// The 12 box edges as corner index pairs.
pub const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0), // -Z face
    (4, 5), (5, 6), (6, 7), (7, 4), // +Z face
    (0, 4), (1, 5), (2, 6), (3, 7), // connecting
];

/// Threshold under which `|sin(pitch)|` is treated as gimbal lock.
const GIMBAL_EPS: f64 = 0.999_999_9;

/// Local axis of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> DVec3 {
        match self {
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Box corners in local space (rotation-free, centered at origin).
pub fn local_corners(size: DVec3) -> [DVec3; 8] {
    let half = size * 0.5;
    CORNER_SIGNS.map(|s| DVec3::from(s) * half)
}

/// The 8 world-space corners of an oriented box, in canonical order.
///
/// Pure function: the hit tester, the renderers and the persisted
/// `bbox3D_cam` array all go through here.
pub fn box_vertices(center: DVec3, size: DVec3, rotation: DMat3) -> [DVec3; 8] {
    local_corners(size).map(|c| rotation * c + center)
}

/// Homogeneous model matrix: `world = T(center) * R * local`.
pub fn model_matrix(center: DVec3, rotation: DMat3) -> DMat4 {
    DMat4::from_translation(center) * DMat4::from_mat3(rotation)
}

/// Apply a homogeneous transform to a point (w = 1).
#[inline]
pub fn transform_point(m: &DMat4, p: DVec3) -> DVec3 {
    m.transform_point3(p)
}

/// Inverse of a rigid transform (rotation + translation).
///
/// Uses the transpose for the rotational part, which is exact for
/// orthonormal matrices and avoids a general 4x4 inversion.
pub fn rigid_inverse(center: DVec3, rotation: DMat3) -> DMat4 {
    let rt = rotation.transpose();
    DMat4::from_mat3(rt) * DMat4::from_translation(-center)
}

/// General 4x4 inverse, `None` when the matrix is singular.
pub fn invert(m: &DMat4) -> Option<DMat4> {
    let det = m.determinant();
    if det.abs() < f64::EPSILON || !det.is_finite() {
        return None;
    }
    Some(m.inverse())
}

/// Rotation about a single local axis.
pub fn axis_rotation(axis: Axis, radians: f64) -> DMat3 {
    match axis {
        Axis::X => DMat3::from_rotation_x(radians),
        Axis::Y => DMat3::from_rotation_y(radians),
        Axis::Z => DMat3::from_rotation_z(radians),
    }
}

/// Build `Rz(z) * Ry(y) * Rx(x)` from Euler angles stored as `[x, y, z]`.
pub fn matrix_from_euler_zyx(euler: DVec3) -> DMat3 {
    DMat3::from_euler(EulerRot::ZYX, euler.z, euler.y, euler.x)
}

/// Extract `[x, y, z]` Euler angles (ZYX order) from a rotation matrix.
///
/// Near gimbal lock (pitch ~ +-90 deg) the X angle is pinned to 0 and the
/// remaining rotation is folded into Z. The result is for display only.
pub fn euler_zyx_from_matrix(m: &DMat3) -> DVec3 {
    // Row/column naming: mRC, glam stores columns.
    let m11 = m.x_axis.x;
    let m21 = m.x_axis.y;
    let m31 = m.x_axis.z;
    let m12 = m.y_axis.x;
    let m22 = m.y_axis.y;
    let m32 = m.y_axis.z;
    let m33 = m.z_axis.z;

    let y = (-m31.clamp(-1.0, 1.0)).asin();
    if m31.abs() < GIMBAL_EPS {
        DVec3::new(m32.atan2(m33), y, m21.atan2(m11))
    } else {
        DVec3::new(0.0, y, (-m12).atan2(m22))
    }
}

/// Best-effort orthonormal basis from three (possibly skewed) edge vectors.
///
/// Gram-Schmidt on X then Y; Z is rebuilt as `X x Y` so the result is
/// always a proper rotation. Returns `None` if X or Y collapse.
pub fn orthonormal_basis(x: DVec3, y: DVec3) -> Option<DMat3> {
    let bx = x.try_normalize()?;
    let by = (y - bx * bx.dot(y)).try_normalize()?;
    let bz = bx.cross(by);
    Some(DMat3::from_cols(bx, by, bz))
}

/// Re-orthonormalize a rotation matrix (guards slow float drift).
pub fn reorthonormalize(m: &DMat3) -> DMat3 {
    orthonormal_basis(m.x_axis, m.y_axis).unwrap_or(DMat3::IDENTITY)
}

/// Max abs deviation of `m * m^T` from identity.
pub fn orthonormality_error(m: &DMat3) -> f64 {
    let p = *m * m.transpose();
    let d = p - DMat3::IDENTITY;
    d.x_axis
        .abs()
        .max_element()
        .max(d.y_axis.abs().max_element())
        .max(d.z_axis.abs().max_element())
}
