//! Hotkey system - command shortcuts.
//!
//! Box nudges (R/C/D + X/Y/Z + arrows) are held-key state and go straight to
//! the editing session; this table only covers one-shot commands.

use std::collections::HashMap;

use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    Save,
    SelectNext,
    SelectPrev,
    RemoveSelected,
    AlignAxes,
    FrameSelection,
    PrevSample,
    NextSample,
    ToggleSettings,
}

/// Hotkey handler for managing keyboard shortcuts
#[derive(Debug, Clone)]
pub struct HotkeyHandler {
    bindings: HashMap<String, HotkeyAction>,
}

impl Default for HotkeyHandler {
    fn default() -> Self {
        let mut handler = Self { bindings: HashMap::new() };
        handler.setup_default_bindings();
        handler
    }
}

impl HotkeyHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle key press
    pub fn handle_key(&self, key: &str) -> Option<HotkeyAction> {
        self.bindings.get(key).copied()
    }

    /// Handle key with modifiers
    pub fn handle_key_with_modifiers(&self, key: &str, ctrl: bool, shift: bool, alt: bool) -> Option<HotkeyAction> {
        let mut key_combo = String::new();
        if ctrl {
            key_combo.push_str("Ctrl+");
        }
        if shift {
            key_combo.push_str("Shift+");
        }
        if alt {
            key_combo.push_str("Alt+");
        }
        key_combo.push_str(key);

        self.handle_key(&key_combo)
    }

    pub fn add_binding(&mut self, key: impl Into<String>, action: HotkeyAction) {
        self.bindings.insert(key.into(), action);
    }

    pub fn remove_binding(&mut self, key: &str) {
        self.bindings.remove(key);
    }

    pub fn setup_default_bindings(&mut self) {
        use HotkeyAction::*;

        self.add_binding("Ctrl+S", Save);
        self.add_binding("Tab", SelectNext);
        self.add_binding("Shift+Tab", SelectPrev);
        self.add_binding("Delete", RemoveSelected);
        self.add_binding("A", AlignAxes);
        self.add_binding("F", FrameSelection);
        self.add_binding("PageUp", PrevSample);
        self.add_binding("PageDown", NextSample);
        self.add_binding("Ctrl+Comma", ToggleSettings);
    }

    /// Commands triggered this frame (first presses only, no auto-repeat).
    pub fn handle_input(&self, input: &egui::InputState) -> Vec<HotkeyAction> {
        let mut actions = Vec::new();
        for event in &input.events {
            if let egui::Event::Key { key, pressed: true, repeat: false, modifiers, .. } = event {
                let key_str = format!("{:?}", key);
                let ctrl = modifiers.ctrl || modifiers.command;
                if let Some(action) = self.handle_key_with_modifiers(&key_str, ctrl, modifiers.shift, modifiers.alt) {
                    actions.push(action);
                }
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_combos() {
        let h = HotkeyHandler::new();
        assert_eq!(h.handle_key_with_modifiers("S", true, false, false), Some(HotkeyAction::Save));
        assert_eq!(h.handle_key_with_modifiers("S", false, false, false), None);
        assert_eq!(h.handle_key_with_modifiers("Tab", false, true, false), Some(HotkeyAction::SelectPrev));
        assert_eq!(h.handle_key("Tab"), Some(HotkeyAction::SelectNext));
    }

    #[test]
    fn test_rebind() {
        let mut h = HotkeyHandler::new();
        h.remove_binding("A");
        assert_eq!(h.handle_key("A"), None);
        h.add_binding("Ctrl+A", HotkeyAction::AlignAxes);
        assert_eq!(h.handle_key_with_modifiers("A", true, false, false), Some(HotkeyAction::AlignAxes));
    }
}
