//! Error types for code generation and native compilation

use thiserror::Error;

/// Result type alias using this crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating, compiling or loading an
/// evaluator
#[derive(Error, Debug)]
pub enum Error {
    /// The expression still references an unbound input
    #[error("Unresolved input: {0}")]
    UnresolvedInput(String),

    /// The expression has no scalar C translation
    #[error("cannot generate code: {0}")]
    Unsupported(String),

    /// The external C toolchain failed; carries the generated source so
    /// the failure can be diagnosed
    #[error("C toolchain failed: {message}")]
    Toolchain {
        message: String,
        source_text: String,
    },

    /// Loading the built shared library or its symbols failed
    #[error("failed to load compiled evaluator: {0}")]
    Load(#[from] libloading::Error),

    /// Writing or removing scratch files failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
