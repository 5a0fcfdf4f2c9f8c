//! Recoverable error types.
//!
//! Contract violations (unbalanced scopes, NaN constraints, re-entrant layout)
//! are not represented here; those panic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer backend not available: {0}")]
    UnsupportedBackend(&'static str),

    #[error("render resource creation failed: {0}")]
    ResourceCreation(String),
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("theme parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("theme io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("theme key `{key}` has unsupported value")]
    InvalidValue { key: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}
