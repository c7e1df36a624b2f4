//! Error types for the export pipeline

use thiserror::Error;

/// Result type alias using this crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting a shape.
///
/// Every kind is recoverable by the caller; malformed options report the
/// offending key and value instead of aborting the process.
#[derive(Error, Debug)]
pub enum Error {
    /// The value is not an exportable 3D shape
    #[error("{0}")]
    NotAShape(String),

    /// The bounding volume has an infinite axis
    #[error("mesh export: shape is infinite")]
    InfiniteShape,

    /// A reactive input was never bound
    #[error("Unresolved input: {0}")]
    UnresolvedInput(String),

    /// An export option is malformed or out of range
    #[error("invalid parameter {key}={value} ({reason})")]
    InvalidParameter {
        key: String,
        value: String,
        reason: String,
    },

    /// Code generation or the C toolchain failed
    #[error(transparent)]
    Compile(lostwax_codegen::Error),

    /// Writing the mesh file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lostwax_codegen::Error> for Error {
    fn from(err: lostwax_codegen::Error) -> Self {
        match err {
            lostwax_codegen::Error::UnresolvedInput(name) => Error::UnresolvedInput(name),
            other => Error::Compile(other),
        }
    }
}

impl From<lostwax_mesh::Error> for Error {
    fn from(err: lostwax_mesh::Error) -> Self {
        match err {
            lostwax_mesh::Error::InfiniteShape => Error::InfiniteShape,
            lostwax_mesh::Error::InvalidParameter {
                param,
                value,
                reason,
            } => Error::InvalidParameter {
                key: param.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            },
            lostwax_mesh::Error::Io(err) => Error::Io(err),
        }
    }
}

impl From<lostwax_field::Error> for Error {
    fn from(err: lostwax_field::Error) -> Self {
        match err {
            lostwax_field::Error::UnresolvedInput(name) => Error::UnresolvedInput(name),
            other => Error::NotAShape(other.to_string()),
        }
    }
}
