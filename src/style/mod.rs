mod color;
mod property;
pub mod theme;

pub use color::*;
pub use property::*;
pub use theme::{FromThemeValue, ThemeEngine, ThemeValue};

pub(crate) use property::{kind_property_owner, ui_property};
