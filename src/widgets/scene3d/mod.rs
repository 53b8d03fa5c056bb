//! 3D perspective view: orbit camera over the cloud and all boxes.

mod scene_ui;

pub use scene_ui::{Scene3dState, render};
