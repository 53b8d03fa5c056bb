//! Events emitted by the editing session, drained by the app each frame.

use super::handles::ControlKind;
use super::view::ViewKind;
use crate::entities::annotation::LoadWarning;

/// What caused a box mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeCause {
    Drag { view: ViewKind, control: ControlKind },
    Keyboard,
    Added,
    Removed,
    Loaded,
}

/// The box list or a box's geometry changed.
#[derive(Clone, Debug)]
pub struct BoxesChangedEvent {
    pub index: Option<usize>,
    pub cause: ChangeCause,
}

#[derive(Clone, Debug)]
pub struct SelectionChangedEvent {
    pub index: Option<usize>,
}

/// Recovered problems from the last load.
#[derive(Clone, Debug)]
pub struct LoadWarningsEvent {
    pub id: String,
    pub warnings: Vec<LoadWarning>,
}

/// Result of a save request: number of boxes written or an error message.
#[derive(Clone, Debug)]
pub struct SaveFinishedEvent {
    pub id: String,
    pub result: Result<usize, String>,
}
