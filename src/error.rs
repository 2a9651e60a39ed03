//! Error types for the dialogue manager module

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the dialogue engine.
///
/// The adapter never retries or translates these: they are returned to the
/// host pipeline exactly as the engine produced them.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The domain description could not be loaded
    #[error("failed to load domain from {path}: {reason}")]
    Domain { path: PathBuf, reason: String },

    /// An inference or decision cycle failed
    #[error("inference failed: {0}")]
    Inference(String),

    /// No posterior is defined for the queried variable
    #[error("no posterior defined for variable `{0}`")]
    MissingPosterior(String),

    /// The engine was used before `start_system`
    #[error("engine has not been started")]
    NotStarted,

    /// A registered listener failed inside an evaluation pass
    #[error("listener failed: {0}")]
    Listener(String),
}

/// Errors surfaced by the module wiring (configuration, setup, run loop)
#[derive(Error, Debug)]
pub enum DialogueManagerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for module operations
pub type DialogueManagerResult<T> = Result<T, DialogueManagerError>;
