//! Entities - geometry and data types shared by the editor, store and render layers.
//!
//! - `transform` - rigid transform kernel (rotations, Euler ZYX, box corners)
//! - `oriented_box` - the editable box and vertex reconstruction
//! - `collection` - ordered boxes of one sample
//! - `annotation` - persisted JSON records and load reports
//! - `point_cloud` / `loader` - colored cloud and its PLY reader

pub mod annotation;
pub mod collection;
pub mod loader;
pub mod oriented_box;
pub mod point_cloud;
pub mod transform;

pub use annotation::{LoadReport, LoadWarning, PersistedBox};
pub use collection::BoxCollection;
pub use loader::{load_ply, read_ply};
pub use oriented_box::OrientedBox;
pub use point_cloud::{CloudPoint, PointCloud};
pub use transform::Axis;
