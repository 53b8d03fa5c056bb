//! Requests from the box list and sample navigation controls.

#[derive(Clone, Debug)]
pub struct SelectBoxEvent(pub usize);

#[derive(Clone, Debug)]
pub struct RemoveBoxEvent(pub usize);

/// Add a unit box in front of the 3D camera.
#[derive(Clone, Debug)]
pub struct AddBoxEvent;

#[derive(Clone, Debug)]
pub struct AlignAxesEvent;

#[derive(Clone, Debug)]
pub struct SaveSampleEvent;

/// Toggle the exclusion marker of the current sample.
#[derive(Clone, Debug)]
pub struct ToggleExcludedEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigate {
    Previous,
    Next,
    NextUnlabeled,
}

#[derive(Clone, Debug)]
pub struct NavigateEvent(pub Navigate);

#[derive(Clone, Debug)]
pub struct OpenSettingsEvent;
