//! Event handling for AnnotatorApp.
//!
//! - Event bus events (handle_events)
//! - Keyboard input (handle_keyboard_input)

use eframe::egui;
use glam::DVec3;
use log::{debug, info, trace, warn};

use super::AnnotatorApp;
use crate::core::event_bus::downcast_event;
use crate::dialogs::prefs::HotkeyAction;
use crate::editor::events::*;
use crate::editor::keys::EditKey;
use crate::entities::oriented_box::OrientedBox;
use crate::widgets::inspector::inspector_events::*;

/// Extent of a box created with "+".
const NEW_BOX_SIZE: f64 = 1.0;

impl AnnotatorApp {
    /// Handle events from event bus.
    pub fn handle_events(&mut self) {
        let mut deferred_navigate: Option<Navigate> = None;
        let mut deferred_save = false;
        let mut deferred_toggle_excluded = false;

        let events = self.event_bus.poll();
        for event in events {
            // === Session events ===
            if let Some(e) = downcast_event::<SelectionChangedEvent>(&event) {
                trace!("Selection -> {:?}", e.index);
                self.scene.frame_selection(&self.session, self.cloud.as_ref());
                continue;
            }
            if let Some(e) = downcast_event::<BoxesChangedEvent>(&event) {
                trace!("Boxes changed at {:?}: {:?}", e.index, e.cause);
                self.scene.mark_dirty();
                continue;
            }
            if let Some(e) = downcast_event::<LoadWarningsEvent>(&event) {
                let skipped = e.warnings.iter().filter(|w| w.skipped).count();
                for w in &e.warnings {
                    debug!("{}: {}", e.id, w);
                }
                self.status_bar.warn(format!(
                    "{}: {} box issue(s), {} skipped. First: {}",
                    e.id,
                    e.warnings.len(),
                    skipped,
                    e.warnings.first().map(|w| w.to_string()).unwrap_or_default()
                ));
                continue;
            }
            if let Some(e) = downcast_event::<SaveFinishedEvent>(&event) {
                match &e.result {
                    Ok(count) => {
                        info!("Saved {} ({} boxes)", e.id, count);
                        self.status_bar.info(format!("Saved {} ({} boxes)", e.id, count));
                    }
                    Err(msg) => {
                        warn!("Save of {} failed: {}", e.id, msg);
                        self.status_bar.error(format!("Save failed: {}", msg));
                    }
                }
                continue;
            }

            // === Panel requests ===
            if let Some(e) = downcast_event::<SelectBoxEvent>(&event) {
                self.session.select(e.0);
                continue;
            }
            if let Some(e) = downcast_event::<RemoveBoxEvent>(&event) {
                if let Some(b) = self.session.remove(e.0) {
                    self.status_bar.info(format!("Removed box {}", b.obj_id));
                }
                continue;
            }
            if downcast_event::<AddBoxEvent>(&event).is_some() {
                self.add_box_at_target();
                continue;
            }
            if downcast_event::<AlignAxesEvent>(&event).is_some() {
                self.session.align_to_axes();
                continue;
            }
            if downcast_event::<SaveSampleEvent>(&event).is_some() {
                deferred_save = true;
                continue;
            }
            if downcast_event::<ToggleExcludedEvent>(&event).is_some() {
                deferred_toggle_excluded = true;
                continue;
            }
            if let Some(e) = downcast_event::<NavigateEvent>(&event) {
                deferred_navigate = Some(e.0);
                continue;
            }
            if downcast_event::<OpenSettingsEvent>(&event).is_some() {
                self.show_settings = true;
                continue;
            }
            trace!("Unhandled event {}", event.type_name());
        }

        // Sample switches last so nothing above lands on the next sample.
        if deferred_save {
            self.save_current();
        }
        if deferred_toggle_excluded {
            self.toggle_excluded();
        }
        if let Some(to) = deferred_navigate {
            self.navigate(to);
        }
    }

    /// New axis-aligned box at the 3D camera target, ids continue after the
    /// largest numeric id in the sample.
    fn add_box_at_target(&mut self) {
        let next_id = self
            .session
            .boxes()
            .iter()
            .filter_map(|b| b.obj_id.parse::<i64>().ok())
            .max()
            .map_or(0, |n| n + 1);
        let b = OrientedBox::axis_aligned(next_id.to_string(), self.scene.camera.target, DVec3::splat(NEW_BOX_SIZE));
        let index = self.session.add(b);
        self.status_bar.info(format!("Added box {} at index {}", next_id, index));
    }

    /// Route keys: nudge keys to the session, one-shot commands via hotkeys.
    /// Skipped while a text field has focus.
    pub fn handle_keyboard_input(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            self.session.clear_keys();
            return;
        }
        if ctx.input(|i| !i.focused) {
            self.session.clear_keys();
            return;
        }

        let (commands, key_events) = ctx.input(|i| {
            let keys: Vec<(EditKey, bool)> = i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key { key, pressed, modifiers, .. } => {
                        EditKey::transition(&format!("{:?}", key), *pressed, modifiers.command || modifiers.ctrl)
                    }
                    _ => None,
                })
                .collect();
            (self.hotkeys.handle_input(i), keys)
        });

        for (key, pressed) in key_events {
            if pressed {
                self.session.key_down(key);
            } else {
                self.session.key_up(key);
            }
        }
        for command in commands {
            self.apply_hotkey(command);
        }
    }

    fn apply_hotkey(&mut self, action: HotkeyAction) {
        debug!("Hotkey {:?}", action);
        match action {
            HotkeyAction::Save => self.save_current(),
            HotkeyAction::SelectNext => {
                self.session.select_next();
            }
            HotkeyAction::SelectPrev => {
                self.session.select_prev();
            }
            HotkeyAction::RemoveSelected => {
                self.session.remove_selected();
            }
            HotkeyAction::AlignAxes => self.session.align_to_axes(),
            HotkeyAction::FrameSelection => self.scene.frame_selection(&self.session, self.cloud.as_ref()),
            HotkeyAction::PrevSample => self.navigate(Navigate::Previous),
            HotkeyAction::NextSample => self.navigate(Navigate::Next),
            HotkeyAction::ToggleSettings => self.show_settings = !self.show_settings,
        }
    }
}
