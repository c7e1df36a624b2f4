//! Lostwax Scene - JSON scene descriptions
//!
//! This crate recognizes a small JSON vocabulary of implicit shapes and
//! turns a description into a [`lostwax_field::Shape`]: primitives such
//! as spheres and cuboids, boolean operators, blends, and rigid
//! transforms. Numeric parameters may reference named inputs, which are
//! resolved against an [`lostwax_field::Environment`] during
//! recognition.
//!
//! ## Example
//!
//! ```rust
//! use lostwax_field::Environment;
//! use lostwax_scene::recognize;
//! use serde_json::json;
//!
//! let scene = json!({"sphere": {"radius": 2.0}});
//! let shape = recognize(&scene, &Environment::new()).unwrap();
//! assert_eq!(shape.dist.eval(2.0, 0.0, 0.0, 0.0), 0.0);
//! ```

mod error;
mod params;
mod recognize;

pub use error::{Error, Result};
pub use recognize::recognize;
