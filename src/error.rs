//! Error types for the eulogy conversation core.
//!
//! Nothing here is fatal to a conversation. The turn orchestrator converts
//! collaborator failures into transcript messages; these types exist so the
//! collaborator seams and configuration loading can report what went wrong.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Draft generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Draft generator errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation failed: {reason}")]
    Failed { reason: String },

    #[error("Generation timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    #[error("Generation cancelled")]
    Cancelled,
}

/// Intent classifier errors. Always degraded to the `unknown` label.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Classifier {name} failed: {reason}")]
    Failed { name: String, reason: String },

    #[error("Classifier timed out after {timeout:?}")]
    TimedOut { timeout: Duration },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
