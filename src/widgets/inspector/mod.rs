//! Side panel: sample navigation, box list and selected-box readout.

pub mod inspector_events;
mod inspector_ui;

pub use inspector_ui::{SampleInfo, render};
