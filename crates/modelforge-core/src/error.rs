//! Error types for the ModelForge core.

use thiserror::Error;

/// Main error type for model-building operations.
#[derive(Debug, Error)]
pub enum ModelForgeError {
    /// Two explicitly named entities in one model share a resolved name.
    #[error("Naming conflict: '{0}' names two entities in the same model")]
    NamingConflict(String),

    /// A constraint carries an infinite bound on its active side.
    #[error("Invalid bound for constraint '{0}': infinite on the active side")]
    InvalidBound(String),

    /// Numeric evaluation reached a still-symbolic term.
    #[error("Unresolved abstract reference: {0}")]
    UnresolvedAbstract(String),

    /// An entity created after its enclosing model was included inside a
    /// declarative scope.
    #[error("Object '{object}' must be defined before model '{model}' inside a declarative scope")]
    OrderingViolation {
        /// Name of the offending entity.
        object: String,
        /// Name of the model it was included into.
        model: String,
    },

    /// A named entity does not exist in the session or model.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not valid for the entity in its current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type alias for model-building operations.
pub type Result<T> = std::result::Result<T, ModelForgeError>;
