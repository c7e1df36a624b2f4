//! Error types for field values and shapes

use thiserror::Error;

/// Result type alias using this crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when composing or evaluating field values
#[derive(Error, Debug)]
pub enum Error {
    /// A reactive input was still unbound where a concrete value is required
    #[error("Unresolved input: {0}")]
    UnresolvedInput(String),

    /// An operation was applied to values of incompatible types
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}
