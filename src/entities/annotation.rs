//! Persisted box array (`3dbox_refined.json` and friends).
//!
//! Each entry carries redundant geometry: `bbox3D_cam` (8 corners in
//! canonical order) plus `center_cam`, `R_cam` (row-major), `dimensions`
//! (`[size.y, size.z, size.x]`) and `euler_angles_xyz`. Loading prefers the
//! corners; saving regenerates every field from the live box so they agree.
//! Unknown fields ride along in `extras`.

use anyhow::{Context, Result};
use glam::{DMat3, DVec3};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::oriented_box::{GeometryIssue, OrientedBox};
use super::transform;

/// One entry of the persisted array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedBox {
    #[serde(default)]
    pub obj_id: Value,
    #[serde(default)]
    pub category_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_cam: Option<[f64; 3]>,
    #[serde(rename = "R_cam", default, skip_serializing_if = "Option::is_none")]
    pub r_cam: Option<[[f64; 3]; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<[f64; 3]>,
    #[serde(rename = "bbox3D_cam", default, skip_serializing_if = "Option::is_none")]
    pub bbox3d_cam: Option<Vec<[f64; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euler_angles_xyz: Option<[f64; 3]>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// Why a persisted entry was skipped or altered.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadWarning {
    pub index: usize,
    pub obj_id: String,
    pub reason: String,
    /// True if the entry was dropped, false if it was repaired.
    pub skipped: bool,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.skipped { "skipped" } else { "repaired" };
        write!(f, "box #{} ({}) {}: {}", self.index, self.obj_id, verb, self.reason)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub boxes: Vec<OrientedBox>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn skipped(&self) -> usize {
        self.warnings.iter().filter(|w| w.skipped).count()
    }
}

fn id_to_string(v: &Value, index: usize) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => index.to_string(),
        other => other.to_string(),
    }
}

/// Numeric ids stay numeric on the way out.
fn id_to_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) if n.to_string() == id => Value::from(n),
        _ => Value::String(id.to_string()),
    }
}

fn rotation_from_rows(rows: &[[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols_array_2d(rows).transpose()
}

fn rotation_to_rows(r: &DMat3) -> [[f64; 3]; 3] {
    r.transpose().to_cols_array_2d()
}

impl PersistedBox {
    /// Convert to a live box. `Err` carries the skip reason.
    pub fn to_box(&self, index: usize) -> std::result::Result<(OrientedBox, Vec<String>), String> {
        let obj_id = id_to_string(&self.obj_id, index);

        let (mut b, notes) = if let Some(corners) = &self.bbox3d_cam {
            let vertices: Vec<DVec3> = corners.iter().map(|c| DVec3::from(*c)).collect();
            let (b, issues) = OrientedBox::from_vertices(obj_id, self.category_name.clone(), &vertices)
                .map_err(|e| e.to_string())?;
            (b, issues.iter().map(GeometryIssue::to_string).collect())
        } else {
            self.box_from_parameters(obj_id)?
        };

        b.extras = self.extras.clone();
        Ok((b, notes))
    }

    /// Fallback when the corner array is missing.
    fn box_from_parameters(&self, obj_id: String) -> std::result::Result<(OrientedBox, Vec<String>), String> {
        let (Some(c), Some(r), Some(d)) = (self.center_cam, self.r_cam, self.dimensions) else {
            return Err("no bbox3D_cam and incomplete center_cam/R_cam/dimensions".to_string());
        };
        let center = DVec3::from(c);
        // dimensions = [length(y), height(z), width(x)]
        let size = DVec3::new(d[2], d[0], d[1]);
        if !center.is_finite() || !size.is_finite() || size.min_element() <= 0.0 {
            return Err(format!("invalid center/dimensions {:?} {:?}", c, d));
        }
        let raw = rotation_from_rows(&r);
        let mut notes = vec!["built from center_cam/R_cam/dimensions".to_string()];
        if transform::orthonormality_error(&raw) > 1e-6 || raw.determinant() < 0.0 {
            notes.push("R_cam not a rotation, orthonormalized".to_string());
        }
        let rotation = transform::orthonormal_basis(raw.x_axis, raw.y_axis)
            .ok_or_else(|| "degenerate R_cam".to_string())?;
        Ok((OrientedBox::new(obj_id, self.category_name.clone(), center, size, rotation), notes))
    }

    /// Snapshot a live box, regenerating all derived fields.
    pub fn from_box(b: &OrientedBox) -> Self {
        let size = b.size();
        Self {
            obj_id: id_to_value(&b.obj_id),
            category_name: b.category.clone(),
            center_cam: Some(b.center().to_array()),
            r_cam: Some(rotation_to_rows(&b.rotation())),
            dimensions: Some([size.y, size.z, size.x]),
            bbox3d_cam: Some(b.vertices().iter().map(|v| v.to_array()).collect()),
            euler_angles_xyz: Some(b.euler_display().to_array()),
            extras: b.extras.clone(),
        }
    }
}

/// Convert persisted entries, skipping what cannot be used.
pub fn boxes_from_entries(entries: &[PersistedBox]) -> LoadReport {
    let mut report = LoadReport::default();
    for (index, entry) in entries.iter().enumerate() {
        let obj_id = id_to_string(&entry.obj_id, index);
        match entry.to_box(index) {
            Ok((b, notes)) => {
                for reason in notes {
                    warn!("box #{} ({}): {}", index, obj_id, reason);
                    report.warnings.push(LoadWarning { index, obj_id: obj_id.clone(), reason, skipped: false });
                }
                report.boxes.push(b);
            }
            Err(reason) => {
                warn!("box #{} ({}) skipped: {}", index, obj_id, reason);
                report.warnings.push(LoadWarning { index, obj_id, reason, skipped: true });
            }
        }
    }
    info!("Loaded {} boxes ({} skipped)", report.boxes.len(), report.skipped());
    report
}

/// Parse a JSON box array.
pub fn parse_boxes(json: &str) -> Result<LoadReport> {
    let entries: Vec<PersistedBox> = serde_json::from_str(json).context("Box file is not a JSON array of boxes")?;
    Ok(boxes_from_entries(&entries))
}

/// Serialize boxes to pretty JSON (2-space indent).
pub fn serialize_boxes(boxes: &[OrientedBox]) -> Result<String> {
    let entries: Vec<PersistedBox> = boxes.iter().map(PersistedBox::from_box).collect();
    serde_json::to_string_pretty(&entries).context("Failed to serialize boxes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::transform::matrix_from_euler_zyx;

    fn rotated_box() -> OrientedBox {
        OrientedBox::new(
            "12",
            "chair",
            DVec3::new(0.4, -1.2, 6.0),
            DVec3::new(0.6, 0.9, 1.1),
            matrix_from_euler_zyx(DVec3::new(0.05, 0.1, -0.7)),
        )
    }

    #[test]
    fn test_save_then_load() {
        let b = rotated_box();
        let json = serialize_boxes(std::slice::from_ref(&b)).expect("serialize");
        let report = parse_boxes(&json).expect("parse");
        assert!(report.warnings.is_empty());
        let back = &report.boxes[0];
        assert_eq!(back.obj_id, "12");
        assert_eq!(back.category, "chair");
        assert!((back.center() - b.center()).length() < 1e-9);
        assert!((back.size() - b.size()).length() < 1e-9);
        assert!((back.rotation().x_axis - b.rotation().x_axis).length() < 1e-9);
    }

    #[test]
    fn test_saved_fields_layout() {
        let b = rotated_box();
        let p = PersistedBox::from_box(&b);
        assert_eq!(p.obj_id, Value::from(12));
        let d = p.dimensions.expect("dimensions");
        assert_eq!(d, [0.9, 1.1, 0.6]);
        let r = p.r_cam.expect("R_cam");
        // Row 0 col 1 of R is the x component of the local Y axis.
        assert!((r[0][1] - b.rotation().y_axis.x).abs() < 1e-12);
        assert_eq!(p.bbox3d_cam.map(|v| v.len()), Some(8));
    }

    #[test]
    fn test_extras_preserved() {
        let json = r#"[{"obj_id":"a7","category_name":"box","score":0.93,
            "bbox3D_cam":[[-1,-1,-1],[1,-1,-1],[1,1,-1],[-1,1,-1],[-1,-1,1],[1,-1,1],[1,1,1],[-1,1,1]]}]"#;
        let report = parse_boxes(json).expect("parse");
        let b = &report.boxes[0];
        assert_eq!(b.obj_id, "a7");
        assert_eq!(b.extras.get("score"), Some(&Value::from(0.93)));
        let out = serialize_boxes(&report.boxes).expect("serialize");
        assert!(out.contains("\"score\": 0.93"));
        assert!(out.contains("\"obj_id\": \"a7\""));
    }

    #[test]
    fn test_bad_entries_are_skipped_with_warning() {
        let json = r#"[
            {"obj_id":1,"bbox3D_cam":[[0,0,0],[1,0,0]]},
            {"obj_id":2,"bbox3D_cam":[[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0]]},
            {"obj_id":3,"center_cam":[0,0,5],"R_cam":[[1,0,0],[0,1,0],[0,0,1]],"dimensions":[2,3,1]},
            {"obj_id":4}
        ]"#;
        let report = parse_boxes(json).expect("parse");
        assert_eq!(report.boxes.len(), 1);
        assert_eq!(report.skipped(), 3);
        let b = &report.boxes[0];
        assert_eq!(b.obj_id, "3");
        assert!((b.size() - DVec3::new(1.0, 2.0, 3.0)).length() < 1e-12);
        assert!(report.warnings.iter().any(|w| !w.skipped && w.obj_id == "3"));
    }

    #[test]
    fn test_not_an_array_is_error() {
        assert!(parse_boxes("{\"boxes\": 3}").is_err());
    }
}
