//! Error types for shape description recognition

use thiserror::Error;

/// Result type alias using this crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while recognizing a shape description
#[derive(Error, Debug)]
pub enum Error {
    /// The value does not describe a shape at all
    #[error("not a shape: {0}")]
    NotAShape(String),

    /// A shape parameter is missing or malformed
    #[error("invalid shape parameter `{name}`: {reason}")]
    Parameter { name: String, reason: String },

    /// A bounding parameter depends on an input with no binding
    #[error("Unresolved input: {0}")]
    UnresolvedInput(String),

    /// An operator combined 2D and 3D operands
    #[error("`{0}` cannot combine 2D and 3D shapes")]
    MixedDimensions(&'static str),

    /// Value arithmetic on parameters failed
    #[error(transparent)]
    Value(#[from] lostwax_field::Error),
}
