//! Keyboard nudges: hold a mode key, an axis key and press an arrow.
//!
//! | mode | action          |
//! |------|-----------------|
//! | R    | rotate_local    |
//! | C    | translate_local |
//! | D    | resize_local    |
//!
//! Axis keys X/Y/Z pick the local axis, Right/Left the sign. Every key-down
//! applies all currently held (mode, axis, direction) triples once, so key
//! auto-repeat gives continuous motion.

use std::collections::HashSet;

use crate::entities::oriented_box::OrientedBox;
use crate::entities::transform::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMode {
    Rotate,
    Translate,
    Resize,
}

impl KeyMode {
    pub const ALL: [KeyMode; 3] = [KeyMode::Rotate, KeyMode::Translate, KeyMode::Resize];

    pub fn hotkey(&self) -> &'static str {
        match self {
            KeyMode::Rotate => "R",
            KeyMode::Translate => "C",
            KeyMode::Resize => "D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Positive, Direction::Negative];

    pub fn sign(self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// Keys the nudge table listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKey {
    Mode(KeyMode),
    Axis(Axis),
    Arrow(Direction),
}

impl EditKey {
    /// Parse a key name ("R", "x", "ArrowRight", "Left", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "r" => EditKey::Mode(KeyMode::Rotate),
            "c" => EditKey::Mode(KeyMode::Translate),
            "d" => EditKey::Mode(KeyMode::Resize),
            "x" => EditKey::Axis(Axis::X),
            "y" => EditKey::Axis(Axis::Y),
            "z" => EditKey::Axis(Axis::Z),
            "right" | "arrowright" => EditKey::Arrow(Direction::Positive),
            "left" | "arrowleft" => EditKey::Arrow(Direction::Negative),
            _ => return None,
        })
    }

    /// Key event to forward to the held-key set: `Some((key, pressed))`.
    /// Presses with Ctrl/Cmd held belong to command hotkeys; releases always
    /// go through so nothing stays held.
    pub fn transition(name: &str, pressed: bool, command_held: bool) -> Option<(Self, bool)> {
        if pressed && command_held {
            return None;
        }
        Self::from_name(name).map(|k| (k, pressed))
    }
}

/// One entry of the nudge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub mode: KeyMode,
    pub axis: Axis,
    pub direction: Direction,
}

impl KeyCombo {
    /// Apply this nudge to `b`.
    pub fn apply(&self, b: &mut OrientedBox, step: f64, size_floor: f64) {
        let amount = self.direction.sign() * step;
        match self.mode {
            KeyMode::Rotate => b.rotate_local(self.axis, amount),
            KeyMode::Translate => b.translate_local(self.axis, amount),
            KeyMode::Resize => b.resize_local_with_floor(self.axis, amount, size_floor),
        }
    }
}

/// Currently held nudge keys. Input state only, never model state.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    held: HashSet<EditKey>,
}

impl HeldKeys {
    /// Record a key-down and return the triples to apply for it.
    pub fn press(&mut self, key: EditKey) -> Vec<KeyCombo> {
        self.held.insert(key);
        self.active()
    }

    pub fn release(&mut self, key: EditKey) {
        self.held.remove(&key);
    }

    /// Drop everything (focus lost, sample switched).
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: EditKey) -> bool {
        self.held.contains(&key)
    }

    /// All held (mode, axis, direction) triples in table order.
    pub fn active(&self) -> Vec<KeyCombo> {
        let mut combos = Vec::new();
        for mode in KeyMode::ALL {
            if !self.is_held(EditKey::Mode(mode)) {
                continue;
            }
            for axis in Axis::ALL {
                if !self.is_held(EditKey::Axis(axis)) {
                    continue;
                }
                for direction in Direction::ALL {
                    if self.is_held(EditKey::Arrow(direction)) {
                        combos.push(KeyCombo { mode, axis, direction });
                    }
                }
            }
        }
        combos
    }
}
