//! Render adapter: screen-space geometry with no UI types.

pub mod camera;
pub mod projection;

pub use camera::{BoxWire, OrbitCamera, Scene3d, project_scene};
pub use projection::{BoxOutline, GridLine, GridLineKind, HandleMark, PointSprite, Segment};
