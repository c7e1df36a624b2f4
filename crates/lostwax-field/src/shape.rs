//! Shapes: a signed distance field, a colour field, and a bounding box.

use crate::error::{Error, Result};
use crate::expr::{self, Environment, Expr};
use glam::DVec3;
use std::collections::BTreeSet;
use std::sync::Arc;

/// An axis aligned box enclosing everything a distance field considers
/// inside. Infinite extents mark unbounded shapes such as half spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// A cube centred on the origin with the given half extent.
    pub fn cube(half: f64) -> Self {
        Self {
            min: DVec3::splat(-half),
            max: DVec3::splat(half),
        }
    }

    pub fn infinite() -> Self {
        Self {
            min: DVec3::splat(f64::NEG_INFINITY),
            max: DVec3::splat(f64::INFINITY),
        }
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// True when every extent is a finite number.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn intersection(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    pub fn translate(&self, offset: DVec3) -> BoundingBox {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Scale about the origin by a nonnegative factor.
    pub fn scale(&self, factor: f64) -> BoundingBox {
        BoundingBox {
            min: self.min * factor,
            max: self.max * factor,
        }
    }

    /// Grow every face outward by a margin.
    pub fn expand(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            min: self.min - DVec3::splat(margin),
            max: self.max + DVec3::splat(margin),
        }
    }
}

/// A geometric shape: distance and colour fields over (x, y, z, t)
/// plus a bounding box and dimension flags.
#[derive(Debug, Clone)]
pub struct Shape {
    pub bbox: BoundingBox,
    pub is_2d: bool,
    pub is_3d: bool,
    pub dist: Arc<Expr>,
    pub colour: Arc<Expr>,
}

impl Shape {
    /// Free inputs across both fields. The bounding box is always
    /// concrete and contributes none.
    pub fn free_inputs(&self) -> BTreeSet<String> {
        let mut names = self.dist.free_inputs();
        names.extend(self.colour.free_inputs());
        names
    }

    /// Substitute bound inputs in both fields.
    pub fn resolve(&self, env: &Environment) -> Shape {
        Shape {
            bbox: self.bbox,
            is_2d: self.is_2d,
            is_3d: self.is_3d,
            dist: expr::resolve(&self.dist, env),
            colour: expr::resolve(&self.colour, env),
        }
    }
}

/// Anything that can evaluate a shape's fields at a point in space
/// and time. Implementations must be safe to call from many threads.
pub trait Evaluator: Send + Sync {
    fn dist(&self, x: f64, y: f64, z: f64, t: f64) -> f64;
    fn colour(&self, x: f64, y: f64, z: f64, t: f64) -> DVec3;
}

/// Tree walking evaluator over the expression graphs directly.
#[derive(Debug)]
pub struct Interpreter {
    dist: Arc<Expr>,
    colour: Arc<Expr>,
}

impl Interpreter {
    /// Build an interpreter for a fully resolved shape. Shapes with
    /// free inputs cannot be evaluated and are rejected.
    pub fn new(shape: &Shape) -> Result<Self> {
        let free = shape.free_inputs();
        if !free.is_empty() {
            let names: Vec<String> = free.into_iter().collect();
            return Err(Error::UnresolvedInput(names.join(", ")));
        }
        Ok(Self {
            dist: shape.dist.clone(),
            colour: shape.colour.clone(),
        })
    }
}

impl Evaluator for Interpreter {
    fn dist(&self, x: f64, y: f64, z: f64, t: f64) -> f64 {
        self.dist.eval(x, y, z, t)
    }

    fn colour(&self, x: f64, y: f64, z: f64, t: f64) -> DVec3 {
        self.colour.eval_vec3(x, y, z, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Coord, length3, sub};
    use approx::assert_relative_eq;

    fn unit_sphere() -> Shape {
        let x = Expr::coord(Coord::X);
        let y = Expr::coord(Coord::Y);
        let z = Expr::coord(Coord::Z);
        Shape {
            bbox: BoundingBox::cube(1.0),
            is_2d: false,
            is_3d: true,
            dist: sub(length3(x, y, z), Expr::num(1.0)),
            colour: Arc::new(Expr::Vec3([
                Expr::num(0.8),
                Expr::num(0.8),
                Expr::num(0.8),
            ])),
        }
    }

    #[test]
    fn bounding_box_volume_and_union() {
        let a = BoundingBox::cube(1.0);
        assert_relative_eq!(a.volume(), 8.0);
        let b = BoundingBox::cube(0.5).translate(DVec3::new(2.0, 0.0, 0.0));
        let u = a.union(&b);
        assert_relative_eq!(u.max.x, 2.5);
        assert_relative_eq!(u.min.x, -1.0);
    }

    #[test]
    fn infinite_box_is_not_finite() {
        assert!(!BoundingBox::infinite().is_finite());
        assert!(BoundingBox::cube(3.0).is_finite());
    }

    #[test]
    fn interpreter_evaluates_distance_and_colour() {
        let shape = unit_sphere();
        let eval = Interpreter::new(&shape).unwrap();
        assert_relative_eq!(eval.dist(0.0, 0.0, 0.0, 0.0), -1.0);
        assert_relative_eq!(eval.dist(2.0, 0.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(eval.colour(0.0, 0.0, 0.0, 0.0).x, 0.8);
    }

    #[test]
    fn interpreter_rejects_free_inputs() {
        let mut shape = unit_sphere();
        shape.dist = sub(shape.dist.clone(), Expr::input("r"));
        let err = Interpreter::new(&shape).unwrap_err();
        assert!(err.to_string().contains('r'));
    }

    #[test]
    fn resolve_produces_an_evaluable_shape() {
        let mut shape = unit_sphere();
        shape.dist = sub(shape.dist.clone(), Expr::input("grow"));
        let mut env = Environment::new();
        env.bind_num("grow", 0.5);
        let resolved = shape.resolve(&env);
        let eval = Interpreter::new(&resolved).unwrap();
        assert_relative_eq!(eval.dist(0.0, 0.0, 0.0, 0.0), -1.5);
    }
}
