//! Error types for the serializers.

use thiserror::Error;

/// Errors raised while exporting a model.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The matrix format only carries linear problems.
    #[error("Nonlinear expression in '{0}' cannot be exported in matrix form")]
    Nonlinear(String),

    /// A symbolic reference (unbound iterator, unvalued parameter) reached
    /// a purely numeric format.
    #[error("Unresolved symbolic reference in '{0}'")]
    Unresolved(String),

    /// A constraint references a variable outside the model.
    #[error("Variable '{0}' is referenced but not included in the model")]
    NotInModel(String),
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
