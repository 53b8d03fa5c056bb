//! File system annotation store.
//!
//! Layout, one directory per sample:
//!
//! ```text
//! <root>/<id>/depth_scene.ply              point cloud (any *.ply accepted)
//! <root>/<id>/3dbbox_ground_no_icp.json    detector boxes
//! <root>/<id>/3dbox_refined.json           saved refinement
//! <root>/<id>/annotation_meta.json         annotator + timing
//! <root>/<id>/deleted.json                 exclusion marker
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use super::{AnnotationMeta, AnnotationStore, ExclusionMarker};
use crate::entities::annotation::{self, LoadReport};
use crate::entities::loader;
use crate::entities::oriented_box::OrientedBox;
use crate::entities::point_cloud::PointCloud;

pub const CLOUD_FILE: &str = "depth_scene.ply";
pub const REFINED_FILE: &str = "3dbox_refined.json";
pub const DETECTED_FILE: &str = "3dbbox_ground_no_icp.json";
pub const META_FILE: &str = "annotation_meta.json";
pub const EXCLUDED_FILE: &str = "deleted.json";
/// Annotator file from older tool versions; counts as labeled.
const LEGACY_INFO_FILE: &str = "annotator_info.json";

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    max_depth: f64,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>, max_depth: f64) -> Self {
        Self { root: root.into(), max_depth }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sample_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    fn file(&self, id: &str, name: &str) -> PathBuf {
        self.sample_dir(id).join(name)
    }

    /// `depth_scene.ply`, else the first `*.ply` by name.
    fn cloud_path(&self, id: &str) -> Result<PathBuf> {
        let preferred = self.file(id, CLOUD_FILE);
        if preferred.is_file() {
            return Ok(preferred);
        }
        let dir = self.sample_dir(id);
        let mut candidates: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read sample dir {}", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ply")))
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .next()
            .with_context(|| format!("No point cloud in {}", dir.display()))
    }

    fn write_pretty(&self, id: &str, name: &str, contents: &str) -> Result<PathBuf> {
        let dir = self.sample_dir(id);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl AnnotationStore for FsStore {
    fn load_point_cloud(&self, id: &str) -> Result<PointCloud> {
        let path = self.cloud_path(id)?;
        let mut cloud = loader::load_ply(&path)?;
        let dropped = cloud.retain_depth(self.max_depth);
        if dropped > 0 {
            debug!("Dropped {} points beyond {} m", dropped, self.max_depth);
        }
        info!("Loaded {} points from {}", cloud.len(), path.display());
        Ok(cloud)
    }

    fn load_boxes(&self, id: &str) -> Result<LoadReport> {
        let refined = self.file(id, REFINED_FILE);
        let path = if refined.is_file() { refined } else { self.file(id, DETECTED_FILE) };
        if !path.is_file() {
            warn!("No boxes for {}", id);
            return Ok(LoadReport::default());
        }
        let json = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        annotation::parse_boxes(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn save_boxes(&self, id: &str, boxes: &[OrientedBox]) -> Result<()> {
        let json = annotation::serialize_boxes(boxes)?;
        let path = self.write_pretty(id, REFINED_FILE, &json)?;
        info!("Saved {} boxes to {}", boxes.len(), path.display());
        Ok(())
    }

    fn save_meta(&self, id: &str, meta: &AnnotationMeta) -> Result<()> {
        if meta.annotator.is_empty() {
            bail!("Annotator name is required");
        }
        let json = serde_json::to_string_pretty(meta).context("Failed to serialize annotation meta")?;
        self.write_pretty(id, META_FILE, &json)?;
        Ok(())
    }

    fn mark_excluded(&self, id: &str, annotator: &str) -> Result<()> {
        if annotator.trim().is_empty() {
            bail!("Annotator name is required");
        }
        for name in [REFINED_FILE, META_FILE, LEGACY_INFO_FILE] {
            let path = self.file(id, name);
            if path.is_file() {
                fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
                debug!("Removed {}", path.display());
            }
        }
        let json = serde_json::to_string_pretty(&ExclusionMarker::new(annotator))
            .context("Failed to serialize exclusion marker")?;
        self.write_pretty(id, EXCLUDED_FILE, &json)?;
        info!("Excluded {} ({})", id, annotator.trim());
        Ok(())
    }

    fn unmark_excluded(&self, id: &str) -> Result<()> {
        let path = self.file(id, EXCLUDED_FILE);
        if !path.is_file() {
            bail!("Sample {} is not excluded", id);
        }
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        info!("Restored {}", id);
        Ok(())
    }

    fn is_excluded(&self, id: &str) -> bool {
        self.file(id, EXCLUDED_FILE).is_file()
    }

    fn is_labeled(&self, id: &str) -> bool {
        [REFINED_FILE, META_FILE, LEGACY_INFO_FILE]
            .iter()
            .any(|name| self.file(id, name).is_file())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read data root {}", self.root.display()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("boxrefine_store_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const DETECTED: &str = r#"[{"obj_id": 3, "category_name": "table",
        "center_cam": [0, 0, 5], "R_cam": [[1,0,0],[0,1,0],[0,0,1]],
        "dimensions": [2, 1, 4]}]"#;

    #[test]
    fn test_refined_overrides_detected() {
        let root = temp_root("refined");
        let store = FsStore::new(&root, 500.0);
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a").join(DETECTED_FILE), DETECTED).unwrap();

        let report = store.load_boxes("a").unwrap();
        assert_eq!(report.boxes.len(), 1);
        assert!((report.boxes[0].size().x - 4.0).abs() < 1e-12);

        let mut edited = report.boxes.clone();
        edited[0].set_center(DVec3::new(1.0, 0.0, 5.0));
        store.save_boxes("a", &edited).unwrap();
        let again = store.load_boxes("a").unwrap();
        assert!((again.boxes[0].center().x - 1.0).abs() < 1e-9);
        assert!(store.is_labeled("a"));

        // Sample without any box file loads empty.
        fs::create_dir_all(root.join("b")).unwrap();
        assert!(store.load_boxes("b").unwrap().boxes.is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_exclusion_cycle() {
        let root = temp_root("exclude");
        let store = FsStore::new(&root, 500.0);
        store.save_boxes("s", &[]).unwrap();
        assert!(store.mark_excluded("s", "").is_err());

        store.mark_excluded("s", "ann").unwrap();
        assert!(store.is_excluded("s"));
        assert!(!root.join("s").join(REFINED_FILE).exists());

        store.unmark_excluded("s").unwrap();
        assert!(!store.is_excluded("s"));
        assert!(store.unmark_excluded("s").is_err());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_listing_and_neighbours() {
        let root = temp_root("list");
        for id in ["0003", "0001", "0002"] {
            fs::create_dir_all(root.join(id)).unwrap();
        }
        fs::write(root.join("notes.txt"), "x").unwrap();
        let store = FsStore::new(&root, 500.0);
        assert_eq!(store.list_ids().unwrap(), vec!["0001", "0002", "0003"]);

        let n = store.neighbours("0002").unwrap();
        assert_eq!(n.index, Some(1));
        assert_eq!(n.previous.as_deref(), Some("0001"));
        assert_eq!(n.next.as_deref(), Some("0003"));

        let first = store.neighbours("0001").unwrap();
        assert_eq!(first.previous, None);
        assert_eq!(store.neighbours("zzz").unwrap().index, None);

        store.save_boxes("0002", &[]).unwrap();
        assert_eq!(store.next_unlabeled("0001").unwrap().as_deref(), Some("0003"));
        store.mark_excluded("0003", "ann").unwrap();
        assert_eq!(store.next_unlabeled("0001").unwrap(), None);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_point_cloud_any_ply() {
        let root = temp_root("cloud");
        fs::create_dir_all(root.join("p")).unwrap();
        let ply = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 1\n0 0 900\n";
        fs::write(root.join("p").join("scan.ply"), ply).unwrap();
        let store = FsStore::new(&root, 500.0);
        let cloud = store.load_point_cloud("p").unwrap();
        assert_eq!(cloud.len(), 1);
        assert!(store.load_point_cloud("missing").is_err());
        let _ = fs::remove_dir_all(&root);
    }
}
