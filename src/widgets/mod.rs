//! UI Widgets - modular, reusable UI components
//!
//! Each widget is self-contained and communicates via EventBus

pub mod actions;
pub mod canvas;
pub mod inspector;
pub mod scene3d;
pub mod status;
