use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::ThemeError;
use crate::geometry::{CornerRadius, Thickness};

use super::Color;

/// A themed value as stored in a theme file.
///
/// JSON numbers, booleans and `#hex` strings map to the obvious variants;
/// `{left, top, right, bottom}` objects are thicknesses and
/// `{top_left, top_right, bottom_right, bottom_left}` objects corner radii.
/// Any other string is text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThemeValue {
    Number(f32),
    Bool(bool),
    Color(Color),
    Thickness(Thickness),
    CornerRadius(CornerRadius),
    Text(SmolStr),
}

impl ThemeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Color(_) => "color",
            Self::Thickness(_) => "thickness",
            Self::CornerRadius(_) => "corner radius",
            Self::Text(_) => "text",
        }
    }
}

pub trait FromThemeValue: Sized {
    fn from_theme_value(value: &ThemeValue) -> Option<Self>;
}

impl FromThemeValue for f32 {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        match value {
            ThemeValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromThemeValue for Option<f32> {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        f32::from_theme_value(value).map(Some)
    }
}

impl FromThemeValue for bool {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        match value {
            ThemeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromThemeValue for Color {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        match value {
            ThemeValue::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl FromThemeValue for Thickness {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        match value {
            ThemeValue::Thickness(t) => Some(*t),
            ThemeValue::Number(n) => Some(Thickness::uniform(*n)),
            _ => None,
        }
    }
}

impl FromThemeValue for CornerRadius {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        match value {
            ThemeValue::CornerRadius(r) => Some(*r),
            ThemeValue::Number(n) => Some(CornerRadius::uniform(*n)),
            _ => None,
        }
    }
}

impl FromThemeValue for SmolStr {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        match value {
            ThemeValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromThemeValue for String {
    fn from_theme_value(value: &ThemeValue) -> Option<Self> {
        SmolStr::from_theme_value(value).map(|s| s.to_string())
    }
}

/// Flat key/value table consulted by unset themed properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThemeEngine {
    values: FxHashMap<SmolStr, ThemeValue>,
}

impl ThemeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, ThemeError> {
        let values: FxHashMap<SmolStr, ThemeValue> = serde_json::from_str(raw)?;
        debug!(entries = values.len(), "theme loaded");
        Ok(Self { values })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn with(mut self, key: impl Into<SmolStr>, value: ThemeValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<SmolStr>, value: ThemeValue) -> Option<ThemeValue> {
        self.values.insert(key.into(), value)
    }

    /// Entries of `other` win over existing ones.
    pub fn merge(&mut self, other: ThemeEngine) {
        self.values.extend(other.values);
    }

    pub fn get(&self, key: &str) -> Option<&ThemeValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `Ok(None)` when the key is absent, an error when it holds a value of
    /// another type.
    pub fn try_resolve<T: FromThemeValue>(&self, key: &str) -> Result<Option<T>, ThemeError> {
        let Some(value) = self.values.get(key) else {
            return Ok(None);
        };
        T::from_theme_value(value)
            .map(Some)
            .ok_or_else(|| ThemeError::InvalidValue {
                key: format!("{key} ({})", value.type_name()),
            })
    }

    pub fn resolve<T: FromThemeValue>(&self, key: &str) -> Option<T> {
        match self.try_resolve(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "ignoring theme entry");
                None
            }
        }
    }
}

static CURRENT_THEME: Lazy<RwLock<Arc<ThemeEngine>>> =
    Lazy::new(|| RwLock::new(Arc::new(ThemeEngine::default())));

/// Replaces the process-wide theme. Trees created afterwards pick it up.
pub fn install(theme: ThemeEngine) -> Arc<ThemeEngine> {
    let theme = Arc::new(theme);
    *CURRENT_THEME.write().unwrap_or_else(PoisonError::into_inner) = theme.clone();
    debug!(entries = theme.len(), "theme installed");
    theme
}

pub fn current() -> Arc<ThemeEngine> {
    CURRENT_THEME
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn reset() {
    install(ThemeEngine::default());
}

#[cfg(test)]
mod tests {
    use super::{ThemeEngine, ThemeValue};
    use crate::error::ThemeError;
    use crate::geometry::{CornerRadius, Thickness};
    use crate::style::Color;

    const THEME: &str = r##"{
        "text.size": 14,
        "text.color": "#336699",
        "border.padding": { "left": 1, "top": 2, "right": 3, "bottom": 4 },
        "border.radius": { "top_left": 4, "top_right": 4, "bottom_right": 0, "bottom_left": 0 },
        "item.selectable": true,
        "font.family": "Inter"
    }"##;

    #[test]
    fn json_values_map_to_variants() {
        let theme = ThemeEngine::from_json(THEME).expect("valid theme");
        assert_eq!(theme.resolve::<f32>("text.size"), Some(14.0));
        assert_eq!(theme.resolve::<Color>("text.color"), Some(Color::rgb(0x33, 0x66, 0x99)));
        assert_eq!(
            theme.resolve::<Thickness>("border.padding"),
            Some(Thickness::new(1.0, 2.0, 3.0, 4.0))
        );
        assert_eq!(
            theme.resolve::<CornerRadius>("border.radius").map(|r| r.top_left),
            Some(4.0)
        );
        assert_eq!(theme.resolve::<bool>("item.selectable"), Some(true));
        assert!(matches!(theme.get("font.family"), Some(ThemeValue::Text(s)) if s == "Inter"));
        assert_eq!(theme.resolve::<Thickness>("text.size"), Some(Thickness::uniform(14.0)));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let theme = ThemeEngine::from_json(THEME).expect("valid theme");
        assert!(matches!(
            theme.try_resolve::<Color>("text.size"),
            Err(ThemeError::InvalidValue { .. })
        ));
        assert_eq!(theme.resolve::<Color>("text.size"), None);
        assert_eq!(theme.try_resolve::<f32>("missing").ok(), Some(None));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(ThemeEngine::from_json("[1, 2"), Err(ThemeError::Parse(_))));
    }

    #[test]
    fn installed_theme_becomes_current() {
        let installed = super::install(ThemeEngine::new().with("theme.install.marker", ThemeValue::Number(3.0)));
        assert_eq!(super::current().resolve::<f32>("theme.install.marker"), Some(3.0));
        assert_eq!(installed.len(), 1);
        super::reset();
        assert!(super::current().get("theme.install.marker").is_none());
    }
}
