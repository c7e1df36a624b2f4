//! Shape recognizer
//!
//! Turns a JSON scene description into a [`Shape`]. A description is an
//! object with a single keyword naming a primitive, an operator or a
//! transform, for example `{"sphere": {"radius": 1}}`. Transforms work
//! by rewriting the coordinate expressions handed to their child, so the
//! whole scene collapses into one distance graph over `(x, y, z, t)`.
//!
//! Bounding boxes are computed structurally alongside the graph. Any
//! parameter a bounding box depends on must be concrete once the
//! environment is applied; time-varying parameters are bounded by their
//! value at time zero.

use crate::error::{Error, Result};
use crate::params::{bound_at_t0, param_error, parse_param, parse_triple};
use glam::DVec3;
use lostwax_field::expr::{
    abs, add, clamp, div, length2, length3, max, min, mix, mul, neg, sub,
};
use lostwax_field::{BoundingBox, Coord, Environment, Expr, Shape, Value, ValueType};
use serde_json::Value as Json;
use std::sync::Arc;

/// Coordinate expressions for the frame a subtree is built in.
type Frame = [Arc<Expr>; 3];

/// A recognized subtree: its distance graph, bounds and dimensions.
struct Recognized {
    dist: Arc<Expr>,
    bbox: BoundingBox,
    is_2d: bool,
    is_3d: bool,
}

/// A scalar parameter in both of the forms the builders need: as an
/// expression for the distance graph and as its value at time zero for
/// the bounding box.
struct Param {
    expr: Arc<Expr>,
    at_t0: f64,
}

/// Recognize a scene description against an environment of input
/// bindings.
///
/// The top level is either a shape directly, or a wrapper object with a
/// `shape` field and an optional `colour` field holding an RGB triple.
pub fn recognize(json: &Json, env: &Environment) -> Result<Shape> {
    let frame = [
        Expr::coord(Coord::X),
        Expr::coord(Coord::Y),
        Expr::coord(Coord::Z),
    ];
    if let Json::Object(map) = json {
        if let Some(body) = map.get("shape") {
            for key in map.keys() {
                if key != "shape" && key != "colour" {
                    return Err(Error::NotAShape(format!(
                        "unknown field `{key}` in shape description"
                    )));
                }
            }
            let colour = match map.get("colour") {
                Some(c) => parse_colour(c, env)?,
                None => default_colour(),
            };
            let r = build(body, env, &frame)?;
            return Ok(Shape {
                bbox: r.bbox,
                is_2d: r.is_2d,
                is_3d: r.is_3d,
                dist: r.dist,
                colour,
            });
        }
    }
    let r = build(json, env, &frame)?;
    Ok(Shape {
        bbox: r.bbox,
        is_2d: r.is_2d,
        is_3d: r.is_3d,
        dist: r.dist,
        colour: default_colour(),
    })
}

fn build(json: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let Json::Object(map) = json else {
        return Err(Error::NotAShape(describe(json)));
    };
    let mut entries = map.iter();
    let (Some((keyword, body)), None) = (entries.next(), entries.next()) else {
        return Err(Error::NotAShape(
            "expected an object with a single shape keyword".to_string(),
        ));
    };
    match keyword.as_str() {
        "sphere" => sphere(body, env, p),
        "cuboid" => cuboid(body, env, p),
        "cylinder" => cylinder(body, env, p),
        "capsule" => capsule(body, env, p),
        "torus" => torus(body, env, p),
        "half_space" => half_space(body, p),
        "circle" => circle(body, env, p),
        "union" => combine(Combine::Union, body, env, p),
        "intersection" => combine(Combine::Intersection, body, env, p),
        "difference" => combine(Combine::Difference, body, env, p),
        "smooth_union" => smooth_union(body, env, p),
        "translate" => translate(body, env, p),
        "scale" => scale(body, env, p),
        "rotate_y" => rotate_y(body, env, p),
        other => Err(Error::NotAShape(format!("unknown shape keyword `{other}`"))),
    }
}

fn describe(json: &Json) -> String {
    match json {
        Json::Null => "null".to_string(),
        Json::Bool(_) => "a boolean".to_string(),
        Json::Number(_) => "a number".to_string(),
        Json::String(_) => "a string".to_string(),
        Json::Array(_) => "an array".to_string(),
        Json::Object(_) => "an object".to_string(),
    }
}

fn field<'a>(body: &'a Json, name: &'static str) -> Result<&'a Json> {
    body.as_object()
        .and_then(|map| map.get(name))
        .ok_or_else(|| param_error(name, "missing"))
}

/// The expression form of a scalar value, rejecting vectors.
fn scalar(name: &'static str, value: &Value) -> Result<Arc<Expr>> {
    let vector = match value {
        Value::Num(_) => false,
        Value::Vec(_) => true,
        Value::Reactive(r) => r.ty() == ValueType::Vector,
    };
    if vector {
        return Err(param_error(name, "expected a scalar value"));
    }
    Ok(value.to_expr())
}

fn param_of(name: &'static str, value: &Value) -> Result<Param> {
    Ok(Param {
        expr: scalar(name, value)?,
        at_t0: bound_at_t0(name, value)?,
    })
}

fn scalar_param(body: &Json, name: &'static str, env: &Environment) -> Result<Param> {
    let value = parse_param(name, field(body, name)?, env)?;
    param_of(name, &value)
}

fn triple_param(body: &Json, name: &'static str, env: &Environment) -> Result<[Param; 3]> {
    let [x, y, z] = parse_triple(name, field(body, name)?, env)?;
    Ok([
        param_of(name, &x)?,
        param_of(name, &y)?,
        param_of(name, &z)?,
    ])
}

fn parse_colour(json: &Json, env: &Environment) -> Result<Arc<Expr>> {
    let [r, g, b] = parse_triple("colour", json, env)?;
    Ok(Value::vec3(&r, &g, &b)?.to_expr())
}

fn default_colour() -> Arc<Expr> {
    let grey = Expr::num(0.8);
    Arc::new(Expr::Vec3([grey.clone(), grey.clone(), grey]))
}

fn sphere(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let radius = scalar_param(body, "radius", env)?;
    Ok(Recognized {
        dist: sub(
            length3(p[0].clone(), p[1].clone(), p[2].clone()),
            radius.expr,
        ),
        bbox: BoundingBox::cube(radius.at_t0),
        is_2d: false,
        is_3d: true,
    })
}

/// An axis aligned box. `size` holds the full extents along each axis.
fn cuboid(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let size = triple_param(body, "size", env)?;
    let zero = Expr::num(0.0);
    let two = Expr::num(2.0);
    let q: Vec<Arc<Expr>> = size
        .iter()
        .zip(p.iter())
        .map(|(s, c)| sub(abs(c.clone()), div(s.expr.clone(), two.clone())))
        .collect();
    let outside = length3(
        max(q[0].clone(), zero.clone()),
        max(q[1].clone(), zero.clone()),
        max(q[2].clone(), zero.clone()),
    );
    let inside = min(max(q[0].clone(), max(q[1].clone(), q[2].clone())), zero);
    let half = DVec3::new(size[0].at_t0, size[1].at_t0, size[2].at_t0) * 0.5;
    Ok(Recognized {
        dist: add(outside, inside),
        bbox: BoundingBox::new(-half, half),
        is_2d: false,
        is_3d: true,
    })
}

/// A cylinder along the y axis. `height` is the full extent.
fn cylinder(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let radius = scalar_param(body, "radius", env)?;
    let height = scalar_param(body, "height", env)?;
    let zero = Expr::num(0.0);
    let q0 = sub(length2(p[0].clone(), p[2].clone()), radius.expr);
    let q1 = sub(abs(p[1].clone()), div(height.expr, Expr::num(2.0)));
    let dist = add(
        min(max(q0.clone(), q1.clone()), zero.clone()),
        length2(max(q0, zero.clone()), max(q1, zero)),
    );
    let hh = height.at_t0 * 0.5;
    Ok(Recognized {
        dist,
        bbox: BoundingBox::new(
            DVec3::new(-radius.at_t0, -hh, -radius.at_t0),
            DVec3::new(radius.at_t0, hh, radius.at_t0),
        ),
        is_2d: false,
        is_3d: true,
    })
}

/// A capsule along the y axis. `height` is the distance between the two
/// cap centres, so the total extent is `height + 2 * radius`.
fn capsule(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let radius = scalar_param(body, "radius", env)?;
    let height = scalar_param(body, "height", env)?;
    let hh = div(height.expr, Expr::num(2.0));
    let along = sub(
        p[1].clone(),
        clamp(p[1].clone(), neg(hh.clone()), hh),
    );
    let dist = sub(length3(p[0].clone(), along, p[2].clone()), radius.expr);
    let reach = height.at_t0 * 0.5 + radius.at_t0;
    Ok(Recognized {
        dist,
        bbox: BoundingBox::new(
            DVec3::new(-radius.at_t0, -reach, -radius.at_t0),
            DVec3::new(radius.at_t0, reach, radius.at_t0),
        ),
        is_2d: false,
        is_3d: true,
    })
}

/// A torus around the y axis. `major` is the centre-to-tube radius,
/// `minor` the tube radius.
fn torus(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let major = scalar_param(body, "major", env)?;
    let minor = scalar_param(body, "minor", env)?;
    let ring = sub(length2(p[0].clone(), p[2].clone()), major.expr);
    let dist = sub(length2(ring, p[1].clone()), minor.expr);
    let reach = major.at_t0 + minor.at_t0;
    Ok(Recognized {
        dist,
        bbox: BoundingBox::new(
            DVec3::new(-reach, -minor.at_t0, -reach),
            DVec3::new(reach, minor.at_t0, reach),
        ),
        is_2d: false,
        is_3d: true,
    })
}

/// Everything below the z = 0 plane. Unbounded, so it can be combined
/// but never meshed on its own.
fn half_space(body: &Json, p: &Frame) -> Result<Recognized> {
    if !matches!(body, Json::Object(map) if map.is_empty()) {
        return Err(param_error("half_space", "takes no parameters"));
    }
    Ok(Recognized {
        dist: p[2].clone(),
        bbox: BoundingBox::infinite(),
        is_2d: false,
        is_3d: true,
    })
}

/// A disc in the xy plane. The distance field ignores z.
fn circle(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let radius = scalar_param(body, "radius", env)?;
    Ok(Recognized {
        dist: sub(length2(p[0].clone(), p[1].clone()), radius.expr),
        bbox: BoundingBox::new(
            DVec3::new(-radius.at_t0, -radius.at_t0, 0.0),
            DVec3::new(radius.at_t0, radius.at_t0, 0.0),
        ),
        is_2d: true,
        is_3d: false,
    })
}

enum Combine {
    Union,
    Intersection,
    Difference,
}

fn combine(op: Combine, body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let name = match op {
        Combine::Union => "union",
        Combine::Intersection => "intersection",
        Combine::Difference => "difference",
    };
    let Json::Array(items) = body else {
        return Err(param_error(name, "expected an array of shapes"));
    };
    let mut items = items.iter();
    let Some(first) = items.next() else {
        return Err(param_error(name, "expected at least one shape"));
    };
    let mut acc = build(first, env, p)?;
    for item in items {
        let next = build(item, env, p)?;
        let is_2d = acc.is_2d && next.is_2d;
        let is_3d = acc.is_3d && next.is_3d;
        if !is_2d && !is_3d {
            return Err(Error::MixedDimensions(name));
        }
        acc = match op {
            Combine::Union => Recognized {
                dist: min(acc.dist, next.dist),
                bbox: acc.bbox.union(&next.bbox),
                is_2d,
                is_3d,
            },
            Combine::Intersection => Recognized {
                dist: max(acc.dist, next.dist),
                bbox: acc.bbox.intersection(&next.bbox),
                is_2d,
                is_3d,
            },
            Combine::Difference => Recognized {
                dist: max(acc.dist, neg(next.dist)),
                bbox: acc.bbox,
                is_2d,
                is_3d,
            },
        };
    }
    Ok(acc)
}

/// Blend two shapes with the polynomial smooth minimum. `k` is the
/// blending radius; the bounds grow by `k` to cover the bulge.
fn smooth_union(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let k = scalar_param(body, "k", env)?;
    if k.at_t0 <= 0.0 || !k.at_t0.is_finite() {
        return Err(param_error("k", "must be positive"));
    }
    let Json::Array(items) = field(body, "shapes")? else {
        return Err(param_error("shapes", "expected an array of two shapes"));
    };
    let [a, b] = &items[..] else {
        return Err(param_error("shapes", "expected an array of two shapes"));
    };
    let a = build(a, env, p)?;
    let b = build(b, env, p)?;
    let is_2d = a.is_2d && b.is_2d;
    let is_3d = a.is_3d && b.is_3d;
    if !is_2d && !is_3d {
        return Err(Error::MixedDimensions("smooth_union"));
    }
    let d1 = a.dist;
    let d2 = b.dist;
    let h = clamp(
        add(
            Expr::num(0.5),
            mul(
                Expr::num(0.5),
                div(sub(d2.clone(), d1.clone()), k.expr.clone()),
            ),
        ),
        Expr::num(0.0),
        Expr::num(1.0),
    );
    let dist = sub(
        mix(d2, d1, h.clone()),
        mul(k.expr, mul(h.clone(), sub(Expr::num(1.0), h))),
    );
    Ok(Recognized {
        dist,
        bbox: a.bbox.union(&b.bbox).expand(k.at_t0),
        is_2d,
        is_3d,
    })
}

fn translate(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let offset = triple_param(body, "offset", env)?;
    let q = [
        sub(p[0].clone(), offset[0].expr.clone()),
        sub(p[1].clone(), offset[1].expr.clone()),
        sub(p[2].clone(), offset[2].expr.clone()),
    ];
    let child = build(field(body, "shape")?, env, &q)?;
    let shift = DVec3::new(offset[0].at_t0, offset[1].at_t0, offset[2].at_t0);
    Ok(Recognized {
        dist: child.dist,
        bbox: child.bbox.translate(shift),
        is_2d: child.is_2d,
        is_3d: child.is_3d,
    })
}

/// Uniform scaling about the origin. The child is queried in shrunk
/// coordinates and its distance stretched back, which keeps the field
/// Euclidean.
fn scale(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let factor = scalar_param(body, "factor", env)?;
    if factor.at_t0 <= 0.0 || !factor.at_t0.is_finite() {
        return Err(param_error("factor", "must be positive"));
    }
    let q = [
        div(p[0].clone(), factor.expr.clone()),
        div(p[1].clone(), factor.expr.clone()),
        div(p[2].clone(), factor.expr.clone()),
    ];
    let child = build(field(body, "shape")?, env, &q)?;
    Ok(Recognized {
        dist: mul(child.dist, factor.expr),
        bbox: child.bbox.scale(factor.at_t0),
        is_2d: child.is_2d,
        is_3d: child.is_3d,
    })
}

/// Rotation about the y axis. The bounds are the circumscribing
/// cylinder of the child's bounds, so they hold for every angle and a
/// time-varying angle needs no special casing.
fn rotate_y(body: &Json, env: &Environment, p: &Frame) -> Result<Recognized> {
    let angle = parse_param("angle", field(body, "angle")?, env)?;
    let c = scalar("angle", &angle.cos()?)?;
    let s = scalar("angle", &angle.sin()?)?;
    let q = [
        sub(mul(c.clone(), p[0].clone()), mul(s.clone(), p[2].clone())),
        p[1].clone(),
        add(mul(s, p[0].clone()), mul(c, p[2].clone())),
    ];
    let child = build(field(body, "shape")?, env, &q)?;
    let bb = child.bbox;
    let rx = bb.min.x.abs().max(bb.max.x.abs());
    let rz = bb.min.z.abs().max(bb.max.z.abs());
    let reach = rx.hypot(rz);
    Ok(Recognized {
        dist: child.dist,
        bbox: BoundingBox::new(
            DVec3::new(-reach, bb.min.y, -reach),
            DVec3::new(reach, bb.max.y, reach),
        ),
        is_2d: child.is_2d,
        is_3d: child.is_3d,
    })
}
