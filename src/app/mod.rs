//! Application module - AnnotatorApp and related functionality.
//!
//! - `events` - event bus handling and keyboard routing
//! - `sample_io` - loading, saving and excluding samples
//! - `run` - the eframe::App implementation

mod events;
mod run;
mod sample_io;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{EditorSettings, SETTINGS_FILE};
use crate::core::event_bus::EventBus;
use crate::dialogs::prefs::{HotkeyHandler, SettingsCategory};
use crate::editor::session::EditorSession;
use crate::entities::point_cloud::PointCloud;
use crate::paths::{self, PathConfig};
use crate::store::{FsStore, Neighbours};
use crate::widgets::canvas::CanvasSet;
use crate::widgets::scene3d::Scene3dState;
use crate::widgets::status::StatusBar;

/// Main application state.
///
/// Only the 3D camera and the last sample go through eframe storage; the 2D
/// views are refitted on every selection. Editor settings live in their own
/// JSON file.
#[derive(Deserialize, Serialize)]
#[serde(default)]
pub struct AnnotatorApp {
    pub scene: Scene3dState,
    pub last_id: Option<String>,
    #[serde(skip)]
    pub session: EditorSession,
    #[serde(skip)]
    pub store: Option<FsStore>,
    #[serde(skip)]
    pub cloud: Option<PointCloud>,
    #[serde(skip)]
    pub current_id: Option<String>,
    #[serde(skip)]
    pub neighbours: Neighbours,
    #[serde(skip)]
    pub excluded: bool,
    /// When the current sample was opened (annotation timing).
    #[serde(skip)]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub event_bus: EventBus,
    #[serde(skip)]
    pub status_bar: StatusBar,
    #[serde(skip)]
    pub canvases: CanvasSet,
    /// Working copy edited by the settings window.
    #[serde(skip)]
    pub settings: EditorSettings,
    #[serde(skip)]
    pub path_config: PathConfig,
    #[serde(skip)]
    pub hotkeys: HotkeyHandler,
    #[serde(skip)]
    pub show_settings: bool,
    #[serde(skip)]
    pub settings_category: SettingsCategory,
    #[serde(skip)]
    pub inspector_hovered: bool,
}

impl Default for AnnotatorApp {
    fn default() -> Self {
        let event_bus = EventBus::new();
        let settings = EditorSettings::default();
        Self {
            scene: Scene3dState::default(),
            last_id: None,
            session: EditorSession::new(settings.clone(), event_bus.emitter()),
            store: None,
            cloud: None,
            current_id: None,
            neighbours: Neighbours::default(),
            excluded: false,
            opened_at: None,
            event_bus,
            status_bar: StatusBar::new(),
            canvases: CanvasSet::default(),
            settings,
            path_config: PathConfig::default(),
            hotkeys: HotkeyHandler::new(),
            show_settings: false,
            settings_category: SettingsCategory::default(),
            inspector_hovered: false,
        }
    }
}

impl AnnotatorApp {
    /// Wire runtime state after construction or deserialization.
    ///
    /// Skipped fields come back from serde as independent defaults, so the
    /// session is rebuilt on this app's own bus here.
    pub fn attach(&mut self, path_config: PathConfig, settings: EditorSettings, data_root: Option<PathBuf>) {
        self.event_bus = EventBus::new();
        self.session = EditorSession::new(settings.clone(), self.event_bus.emitter());
        self.store = data_root.map(|root| {
            info!("Annotation store: {}", root.display());
            FsStore::new(root, settings.max_depth)
        });
        self.settings = settings;
        self.path_config = path_config;
        if self.store.is_none() {
            self.status_bar.warn("No data root; start with --data-root DIR");
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        paths::config_file(SETTINGS_FILE, &self.path_config)
    }

    /// Push the edited settings into the session and persist them.
    pub fn apply_settings(&mut self) {
        self.settings.sanitize();
        self.session.set_settings(self.settings.clone());
        if let Some(store) = &self.store {
            self.store = Some(FsStore::new(store.root().to_path_buf(), self.settings.max_depth));
        }
        if let Err(e) = self.settings.save(&self.settings_path()) {
            warn!("{:#}", e);
            self.status_bar.warn(format!("Settings not saved: {}", e));
        }
    }
}
