//! Lostwax Engine - The shape to mesh export pipeline
//!
//! Orchestrates the full path from a recognized [`lostwax_field::Shape`]
//! to a mesh file on disk: exportability checks, evaluator selection
//! (compiled native code or the interpreter), voxel sampling, surface
//! extraction and serialization. Export options are parsed here too, so
//! every front end shares one parameter grammar.
//!
//! ## Example
//!
//! ```rust
//! use lostwax_engine::{EvalBackend, ExportParams, MeshFormat, export_shape};
//! use lostwax_field::{BoundingBox, Coord, Expr, Shape, expr};
//!
//! let [x, y, z] = [Coord::X, Coord::Y, Coord::Z].map(Expr::coord);
//! let sphere = Shape {
//!     bbox: BoundingBox::cube(1.0),
//!     is_2d: false,
//!     is_3d: true,
//!     dist: expr::sub(expr::length3(x, y, z), Expr::num(1.0)),
//!     colour: Expr::num(0.8),
//! };
//!
//! let params = ExportParams { res: Some(0.5), adaptivity: 0.0 };
//! let mut stl = Vec::new();
//! let stats = export_shape(
//!     &sphere,
//!     &params,
//!     EvalBackend::Interpreted,
//!     MeshFormat::Stl,
//!     &mut stl,
//! )
//! .unwrap();
//! assert!(stats.quads > 0);
//! ```

mod error;
mod export;
mod params;

pub use error::{Error, Result};
pub use export::{EvalBackend, ExportStats, MeshFormat, export_shape};
pub use params::ExportParams;
