//! Core plumbing independent of UI: the event queue and redraw throttling.

pub mod event_bus;
pub mod throttle;

pub use event_bus::{EventBus, EventEmitter};
pub use throttle::RedrawThrottle;
