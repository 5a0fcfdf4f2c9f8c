//! Retained-mode UI toolkit.
//!
//! Elements live in a [`view::UiTree`]. Each frame the tree is measured,
//! arranged, has its dirty render batches rebuilt and is drawn through a
//! [`render::Renderer`]. See [`view::UiTree::run_frame`].

pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod style;
pub mod transition;
pub mod ui;
pub mod view;

pub use config::UiConfig;
pub use error::{ConfigError, RenderError, ThemeError};
pub use logging::init_logging;
