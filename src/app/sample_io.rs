//! Sample I/O for AnnotatorApp: open, save, exclude, navigate.

use chrono::Utc;
use log::{error, info, warn};

use super::AnnotatorApp;
use crate::editor::events::SaveFinishedEvent;
use crate::entities::annotation::LoadReport;
use crate::store::{AnnotationMeta, AnnotationStore};
use crate::widgets::inspector::inspector_events::Navigate;

impl AnnotatorApp {
    /// Open sample `id`: point cloud and boxes. A missing cloud still opens
    /// the boxes; a box file that fails to parse opens an empty sample.
    pub fn open_sample(&mut self, id: &str) {
        let Some(store) = self.store.clone() else {
            return;
        };
        if self.session.is_modified() {
            warn!("Discarding unsaved edits on {:?}", self.current_id);
        }

        self.cloud = match store.load_point_cloud(id) {
            Ok(cloud) => Some(cloud),
            Err(e) => {
                error!("{:#}", e);
                self.status_bar.error(format!("{:#}", e));
                None
            }
        };
        let report = store.load_boxes(id).unwrap_or_else(|e| {
            error!("{:#}", e);
            self.status_bar.error(format!("{:#}", e));
            LoadReport::default()
        });

        self.neighbours = store.neighbours(id).unwrap_or_default();
        self.excluded = store.is_excluded(id);
        self.current_id = Some(id.to_string());
        self.last_id = Some(id.to_string());
        self.opened_at = Some(Utc::now());

        self.session.clear_keys();
        self.session.load(id, report);
        self.scene.frame_selection(&self.session, self.cloud.as_ref());
        info!("Opened sample {}", id);
    }

    /// Open `preferred` if given, else the last sample, else the first id.
    pub fn open_initial(&mut self, preferred: Option<&str>) {
        let Some(store) = &self.store else {
            return;
        };
        let ids = match store.list_ids() {
            Ok(ids) => ids,
            Err(e) => {
                error!("{:#}", e);
                self.status_bar.error(format!("{:#}", e));
                return;
            }
        };
        let pick = preferred
            .and_then(|p| ids.iter().find(|id| *id == p || id.starts_with(p)))
            .or_else(|| self.last_id.as_ref().and_then(|last| ids.iter().find(|id| *id == last)))
            .or_else(|| ids.first())
            .cloned();
        match pick {
            Some(id) => self.open_sample(&id),
            None => self.status_bar.warn("Data root has no samples"),
        }
    }

    /// Write boxes plus annotation meta for the current sample.
    pub fn save_current(&mut self) {
        let (Some(store), Some(id)) = (self.store.clone(), self.current_id.clone()) else {
            return;
        };
        let boxes = self.session.boxes().as_slice();
        let result = store.save_boxes(&id, boxes).and_then(|_| {
            let annotator = self.settings.annotator.trim();
            if annotator.is_empty() {
                warn!("No annotator name set, meta not written");
                return Ok(());
            }
            let start = self.opened_at.unwrap_or_else(Utc::now);
            let meta = AnnotationMeta::new(&id, annotator, start, Utc::now(), boxes.len());
            store.save_meta(&id, &meta)
        });
        let count = boxes.len();
        if result.is_ok() {
            self.session.mark_saved();
        }
        self.event_bus.emit(SaveFinishedEvent { id, result: result.map(|_| count).map_err(|e| format!("{:#}", e)) });
    }

    /// Flip the exclusion marker of the current sample.
    pub fn toggle_excluded(&mut self) {
        let (Some(store), Some(id)) = (self.store.clone(), self.current_id.clone()) else {
            return;
        };
        let result = if self.excluded {
            store.unmark_excluded(&id)
        } else {
            store.mark_excluded(&id, &self.settings.annotator)
        };
        match result {
            Ok(()) => {
                self.excluded = store.is_excluded(&id);
                let msg = if self.excluded { "Sample opted out" } else { "Opt-out removed" };
                self.status_bar.info(format!("{}: {}", id, msg));
            }
            Err(e) => {
                error!("{:#}", e);
                self.status_bar.error(format!("{:#}", e));
            }
        }
    }

    pub fn navigate(&mut self, to: Navigate) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let target = match to {
            Navigate::Previous => self.neighbours.previous.clone(),
            Navigate::Next => self.neighbours.next.clone(),
            Navigate::NextUnlabeled => {
                let Some(id) = self.current_id.as_deref() else {
                    return;
                };
                match store.next_unlabeled(id) {
                    Ok(next) => next,
                    Err(e) => {
                        self.status_bar.error(format!("{:#}", e));
                        return;
                    }
                }
            }
        };
        match target {
            Some(id) => self.open_sample(&id),
            None => self.status_bar.info("No more samples in that direction"),
        }
    }
}
