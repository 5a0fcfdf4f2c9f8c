//! Retained element tree, panels and text.

pub mod element;
pub mod panel;
pub mod text;

pub use element::*;
pub use panel::*;
pub use text::*;
