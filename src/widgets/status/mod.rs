//! Bottom status bar.

mod status;

pub use status::{Severity, StatusBar};
