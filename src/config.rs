use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_TRACE_LAYOUT: &str = "RFTK_TRACE_LAYOUT";
pub const ENV_WHEEL_STEP: &str = "RFTK_WHEEL_STEP";

/// Toolkit-wide knobs shared by every tree.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Emit a `trace!` line per element for each measure/arrange.
    pub trace_layout: bool,
    /// Pixels scrolled per wheel notch.
    pub wheel_step: f32,
    /// Round every arranged rect to whole pixels, regardless of the
    /// per-element pixel-perfect flag.
    pub pixel_snap: bool,
    /// Horizontal indentation applied per tree depth level.
    pub tree_indent: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            trace_layout: false,
            wheel_step: 40.0,
            pixel_snap: false,
            tree_indent: 16.0,
        }
    }
}

impl UiConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Defaults overridden by `RFTK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_TRACE_LAYOUT) {
            config.trace_layout = !matches!(value.as_str(), "" | "0" | "false");
        }
        if let Some(value) = lookup(ENV_WHEEL_STEP) {
            config.wheel_step = value
                .parse::<f32>()
                .ok()
                .filter(|step| step.is_finite() && *step > 0.0)
                .ok_or(ConfigError::InvalidEnv {
                    var: ENV_WHEEL_STEP,
                    value,
                })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ENV_TRACE_LAYOUT, ENV_WHEEL_STEP, UiConfig};

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = UiConfig::from_json(r#"{ "wheel_step": 12.5 }"#).expect("valid config");
        assert_eq!(config.wheel_step, 12.5);
        assert!(!config.trace_layout);
        assert_eq!(config.tree_indent, 16.0);
    }

    #[test]
    fn env_overrides_are_validated() {
        let config = UiConfig::from_lookup(|var| match var {
            ENV_TRACE_LAYOUT => Some("1".to_string()),
            _ => None,
        })
        .expect("valid env");
        assert!(config.trace_layout);

        let err = UiConfig::from_lookup(|var| match var {
            ENV_WHEEL_STEP => Some("-3".to_string()),
            _ => None,
        });
        assert!(err.is_err());
    }
}
