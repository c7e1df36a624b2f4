//! Error types for voxelization, extraction and serialization

use thiserror::Error;

/// Result type alias using this crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a distance field into a mesh file
#[derive(Error, Debug)]
pub enum Error {
    /// The bounding volume is unbounded, so there is nothing finite to sample
    #[error("shape is infinite")]
    InfiniteShape,

    /// A meshing parameter was out of its valid range
    #[error("invalid parameter {param}={value} ({reason})")]
    InvalidParameter {
        param: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Writing the mesh file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
