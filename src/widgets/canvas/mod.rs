//! 2D orthographic canvases (top, front, side).

mod canvas;
mod canvas_ui;

pub use canvas::{CanvasCache, CanvasSet};
pub use canvas_ui::{CanvasResponse, render};
