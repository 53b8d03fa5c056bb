//! Editor settings, persisted as `boxrefine.json` in the config directory.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Settings file name inside the config directory.
pub const SETTINGS_FILE: &str = "boxrefine.json";

/// Tunables for the editing engine and the 2D canvases.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorSettings {
    // Interaction
    pub hit_radius_px: f64,      // Control-point pick radius (default 15)
    pub size_floor: f64,         // Smallest extent after any edit (default 0.01)
    pub nudge_step: f64,         // Keyboard step, metres or radians (default 0.01)
    pub wheel_zoom_step: f64,    // Fractional zoom change per wheel notch (default 0.1)

    // 2D views
    pub target_occupancy: f64,      // Fraction of the shorter canvas side the box fills on select
    pub redraw_interval_ms: u64,    // Canvas redraw coalescing during drags (default 16)
    pub depth_extension_ratio: f64, // Cloud depth cut below the box floor, relative to size
    pub sample_step_idle: usize,    // Draw every Nth cloud point
    pub sample_step_dragging: usize,
    pub show_grid: bool,

    // Loading
    pub max_depth: f64, // Drop cloud points beyond this |z| (default 500 m)

    // Saving
    pub annotator: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            hit_radius_px: 15.0,
            size_floor: 0.01,
            nudge_step: 0.01,
            wheel_zoom_step: 0.1,
            target_occupancy: 0.5,
            redraw_interval_ms: 16,
            depth_extension_ratio: 0.2,
            sample_step_idle: 2,
            sample_step_dragging: 4,
            show_grid: true,
            max_depth: 500.0,
            annotator: String::new(),
        }
    }
}

impl EditorSettings {
    /// Load settings; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let mut settings: Self =
            serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Clamp values a hand-edited file could break.
    pub fn sanitize(&mut self) {
        let d = Self::default();
        if !(self.hit_radius_px > 0.0) {
            warn!("hit_radius_px {} invalid, using {}", self.hit_radius_px, d.hit_radius_px);
            self.hit_radius_px = d.hit_radius_px;
        }
        if !(self.size_floor > 0.0) {
            warn!("size_floor {} invalid, using {}", self.size_floor, d.size_floor);
            self.size_floor = d.size_floor;
        }
        if !(self.target_occupancy > 0.0 && self.target_occupancy <= 1.0) {
            self.target_occupancy = d.target_occupancy;
        }
        if !(self.wheel_zoom_step > 0.0 && self.wheel_zoom_step < 1.0) {
            self.wheel_zoom_step = d.wheel_zoom_step;
        }
        if !self.nudge_step.is_finite() {
            self.nudge_step = d.nudge_step;
        }
        if !(self.depth_extension_ratio >= 0.0) {
            self.depth_extension_ratio = d.depth_extension_ratio;
        }
        if !(self.max_depth > 0.0) {
            self.max_depth = d.max_depth;
        }
        self.sample_step_idle = self.sample_step_idle.max(1);
        self.sample_step_dragging = self.sample_step_dragging.max(1);
    }

    /// Cloud sample step for the current interaction state.
    pub fn sample_step(&self, dragging: bool) -> usize {
        if dragging { self.sample_step_dragging } else { self.sample_step_idle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let s: EditorSettings = serde_json::from_str(r#"{"hit_radius_px": 20.0, "annotator": "kim"}"#).expect("parse");
        assert_eq!(s.hit_radius_px, 20.0);
        assert_eq!(s.annotator, "kim");
        assert_eq!(s.redraw_interval_ms, 16);
        assert_eq!(s.sample_step(true), 4);
    }

    #[test]
    fn test_sanitize() {
        let mut s = EditorSettings { size_floor: -1.0, target_occupancy: 3.0, sample_step_idle: 0, ..Default::default() };
        s.sanitize();
        assert_eq!(s.size_floor, 0.01);
        assert_eq!(s.target_occupancy, 0.5);
        assert_eq!(s.sample_step_idle, 1);
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir().join(format!("boxrefine_settings_{}.json", std::process::id()));
        let s = EditorSettings { nudge_step: 0.05, ..Default::default() };
        s.save(&path).expect("save");
        assert_eq!(EditorSettings::load(&path).expect("load"), s);
        let _ = std::fs::remove_file(&path);
        assert_eq!(EditorSettings::load(&path).expect("defaults"), EditorSettings::default());
    }
}
