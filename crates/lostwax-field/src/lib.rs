//! Lostwax Field - Implicit function fields and shapes
//!
//! This crate holds the core representation shared by every stage of the
//! pipeline: an expression graph over the coordinates `(x, y, z, t)`,
//! reactive values that defer evaluation until their inputs are bound,
//! and the [`Shape`] type pairing a signed distance field with a colour
//! field and a bounding box.
//!
//! ## Key Types
//!
//! - [`Expr`] - The expression graph, shared through [`std::sync::Arc`]
//! - [`Value`] - A concrete number or vector, or a deferred expression
//! - [`Shape`] - Distance field, colour field, bounding box
//! - [`Evaluator`] - Point evaluation, implemented here by [`Interpreter`]
//!
//! ## Example
//!
//! ```rust
//! use lostwax_field::{Coord, Expr, expr};
//!
//! // d(p) = |p| - 1, a unit sphere
//! let dist = expr::sub(
//!     expr::length3(
//!         Expr::coord(Coord::X),
//!         Expr::coord(Coord::Y),
//!         Expr::coord(Coord::Z),
//!     ),
//!     Expr::num(1.0),
//! );
//! assert_eq!(dist.eval(2.0, 0.0, 0.0, 0.0), 1.0);
//! ```

pub mod expr;

mod error;
mod shape;
mod value;

pub use error::{Error, Result};
pub use expr::{BinaryOp, Coord, Environment, Expr, UnaryOp};
pub use shape::{BoundingBox, Evaluator, Interpreter, Shape};
pub use value::{ReactiveExpr, Value, ValueType};
