//! Preferences window and hotkey table.

pub mod hotkeys;
mod prefs;

pub use hotkeys::{HotkeyAction, HotkeyHandler};
pub use prefs::{SettingsCategory, render_settings_window};
