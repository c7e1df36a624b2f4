//! Lostwax Codegen - native evaluators for shape fields
//!
//! Translates a resolved shape's distance and colour expressions into
//! a C source file, compiles it with the system toolchain, and loads
//! the result as a [`CompiledShape`] implementing the same
//! [`lostwax_field::Evaluator`] contract as the interpreter. The point
//! of the exercise is speed: voxelization calls `dist` millions of
//! times, and the compiled form evaluates identically to the
//! interpreter, NaN and infinity propagation included.

mod compile;
mod error;
mod source;

pub use compile::CompiledShape;
pub use error::{Error, Result};
pub use source::generate;
