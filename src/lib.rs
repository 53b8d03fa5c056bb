//! boxrefine - oriented 3D box refinement over colored point clouds
//!
//! Re-exports all modules for use by the binary target.

// Geometry and editing engine, no UI types
pub mod core;
pub mod editor;
pub mod entities;
pub mod render;
pub mod store;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod dialogs;
pub mod paths;
pub mod widgets;

pub use core::event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use editor::{EditorSession, ViewKind};
pub use entities::{OrientedBox, PointCloud};
pub use store::{AnnotationStore, FsStore};
