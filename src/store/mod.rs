//! Annotation storage.
//!
//! The editor reads and writes samples only through [`AnnotationStore`]; the
//! file system layout lives in [`fs_store`].

pub mod fs_store;

pub use fs_store::FsStore;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::annotation::LoadReport;
use crate::entities::oriented_box::OrientedBox;
use crate::entities::point_cloud::PointCloud;

/// Who annotated a sample and how long it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMeta {
    pub annotator: String,
    pub timestamp: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    pub image_id: String,
    pub bounding_box_count: usize,
}

impl AnnotationMeta {
    /// Meta for a session on `id` that ran from `start` to `end`.
    pub fn new(id: &str, annotator: &str, start: DateTime<Utc>, end: DateTime<Utc>, box_count: usize) -> Self {
        let millis = (end - start).num_milliseconds().max(0);
        // Hundredths of a second.
        let duration_seconds = (millis as f64 / 10.0).round() / 100.0;
        Self {
            annotator: annotator.trim().to_string(),
            timestamp: iso(Utc::now()),
            start_time: iso(start),
            end_time: iso(end),
            duration_seconds,
            image_id: id.to_string(),
            bounding_box_count: box_count,
        }
    }
}

/// Opt-out marker written when a sample is excluded from annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionMarker {
    pub deleted: bool,
    pub timestamp: String,
    pub annotator: String,
    #[serde(default)]
    pub reason: String,
}

impl ExclusionMarker {
    pub fn new(annotator: &str) -> Self {
        Self {
            deleted: true,
            timestamp: iso(Utc::now()),
            annotator: annotator.trim().to_string(),
            reason: "opt_out".to_string(),
        }
    }
}

/// Previous and next sample ids around the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbours {
    pub index: Option<usize>,
    pub total: usize,
    pub previous: Option<String>,
    pub next: Option<String>,
}

/// Storage collaborator of the editor.
pub trait AnnotationStore {
    fn load_point_cloud(&self, id: &str) -> Result<PointCloud>;

    /// Boxes of sample `id`, refined if present, detector output otherwise.
    fn load_boxes(&self, id: &str) -> Result<LoadReport>;

    fn save_boxes(&self, id: &str, boxes: &[OrientedBox]) -> Result<()>;

    fn save_meta(&self, id: &str, meta: &AnnotationMeta) -> Result<()>;

    /// Mark `id` as excluded and drop any saved refinement.
    fn mark_excluded(&self, id: &str, annotator: &str) -> Result<()>;

    /// Undo [`mark_excluded`](Self::mark_excluded). Errors if `id` is not excluded.
    fn unmark_excluded(&self, id: &str) -> Result<()>;

    fn is_excluded(&self, id: &str) -> bool;

    /// True if `id` has a saved refinement or meta file.
    fn is_labeled(&self, id: &str) -> bool;

    /// All sample ids, sorted by name.
    fn list_ids(&self) -> Result<Vec<String>>;

    /// Previous/next ids around `id`. A prefix of an id matches it.
    fn neighbours(&self, id: &str) -> Result<Neighbours> {
        let ids = self.list_ids()?;
        let index = ids.iter().position(|item| item == id || item.starts_with(id));
        Ok(match index {
            Some(i) => Neighbours {
                index: Some(i),
                total: ids.len(),
                previous: i.checked_sub(1).map(|p| ids[p].clone()),
                next: ids.get(i + 1).cloned(),
            },
            None => Neighbours { total: ids.len(), ..Default::default() },
        })
    }

    /// First id after `id` that is neither labeled nor excluded.
    fn next_unlabeled(&self, id: &str) -> Result<Option<String>> {
        let ids = self.list_ids()?;
        let Some(start) = ids.iter().position(|item| item == id) else {
            anyhow::bail!("Sample not found: {}", id);
        };
        Ok(ids
            .into_iter()
            .skip(start + 1)
            .find(|item| !self.is_labeled(item) && !self.is_excluded(item)))
    }
}

fn iso(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meta_fields() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let end = start + chrono::Duration::milliseconds(83_456);
        let meta = AnnotationMeta::new("000123", " ann ", start, end, 4);
        assert_eq!(meta.annotator, "ann");
        assert_eq!(meta.start_time, "2024-03-01T10:00:00.000Z");
        assert!((meta.duration_seconds - 83.46).abs() < 1e-9);

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["imageId"], "000123");
        assert_eq!(json["boundingBoxCount"], 4);
        assert!(json.get("durationSeconds").is_some());
    }
}
