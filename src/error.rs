// src/error.rs
// Error types for the persona engine

use thiserror::Error;

/// Main error type for the engine.
///
/// Composition itself never fails; these errors only travel across the
/// persistence and configuration boundaries and are turned into defaults
/// before they reach the orchestrator.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(String),

    #[error("store fetch timed out: {0}")]
    Timeout(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Result using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Store(s)
    }
}
