//! Oriented-box editing engine.
//!
//! Input flow: pointer event -> `handles::hit_test` -> `DragSession::update`
//! (reading the view's reference frame) -> `OrientedBox` mutation -> dirty
//! flags for the 3D scene and the three 2D canvases.

pub mod drag;
pub mod events;
pub mod frames;
pub mod handles;
pub mod keys;
pub mod session;
pub mod view;

pub use drag::DragSession;
pub use events::{BoxesChangedEvent, ChangeCause, LoadWarningsEvent, SaveFinishedEvent, SelectionChangedEvent};
pub use frames::{ReferenceFrames, ViewReferenceFrame};
pub use handles::{ControlKind, ControlPoint, ViewPose};
pub use keys::{Direction, EditKey, HeldKeys, KeyCombo, KeyMode};
pub use session::{EditorSession, PointerButton, Redraw};
pub use view::{ViewKind, ViewTransform};
