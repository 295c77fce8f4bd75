//! Error types for the solver boundary.

use thiserror::Error;

/// Errors raised while submitting a model or ingesting its solution.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The backend rejected or failed the submission.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend returned a malformed response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration could not be parsed.
    #[error("Invalid solver options: {0}")]
    Options(String),

    /// The model could not be serialized.
    #[error(transparent)]
    Export(#[from] modelforge_export::ExportError),

    /// A model-building invariant failed during write-back.
    #[error(transparent)]
    Core(#[from] modelforge_core::ModelForgeError),
}

/// Result type alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;
