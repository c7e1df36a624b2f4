//! Expression graph to C source translation
//!
//! Emits one C file with two exported functions, `dist_` and
//! `colour_`, both over `(x, y, z, t)` doubles. Every compound
//! subexpression becomes one `const double` temporary; the
//! deduplication table is keyed by structural equality, so subtrees
//! shared in the graph (or merely equal) are computed once. Constants
//! and coordinates are inlined directly.
//!
//! The produced arithmetic must agree bit-for-bit in spirit with the
//! tree-walking interpreter: `fmin`/`fmax` match Rust's NaN-ignoring
//! `f64::min`/`f64::max`, literals carry 17 significant digits so they
//! round-trip exactly, and NaN or infinite constants map to the
//! `<math.h>` macros.

// String writing is infallible, so .unwrap() is safe here
#![allow(clippy::unwrap_used)]

use crate::error::{Error, Result};
use lostwax_field::{BinaryOp, Expr, Shape, UnaryOp};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

/// Generate the complete C translation unit for a shape.
pub fn generate(shape: &Shape) -> Result<String> {
    let mut out = String::new();
    out.push_str("#include <math.h>\n\n");

    let mut body = CGenerator::new();
    let result = body.emit(&shape.dist)?;
    out.push_str("double dist_(double x, double y, double z, double t)\n{\n");
    out.push_str(&body.code);
    writeln!(out, "  return {result};").unwrap();
    out.push_str("}\n\n");

    let mut body = CGenerator::new();
    let comps = match &*shape.colour {
        Expr::Vec3(parts) => [
            body.emit(&parts[0])?,
            body.emit(&parts[1])?,
            body.emit(&parts[2])?,
        ],
        _ => {
            let c = body.emit(&shape.colour)?;
            [c.clone(), c.clone(), c]
        }
    };
    out.push_str("void colour_(double x, double y, double z, double t, double* out)\n{\n");
    out.push_str(&body.code);
    for (i, c) in comps.iter().enumerate() {
        writeln!(out, "  out[{i}] = {c};").unwrap();
    }
    out.push_str("}\n");

    Ok(out)
}

/// Generates the body of one C function, one temporary per compound
/// subexpression.
struct CGenerator {
    var_counter: usize,
    cse: HashMap<Arc<Expr>, String>,
    code: String,
}

impl CGenerator {
    fn new() -> Self {
        Self {
            var_counter: 0,
            cse: HashMap::new(),
            code: String::new(),
        }
    }

    /// Returns the C expression naming this subtree's value: a literal,
    /// a coordinate parameter, or a temporary.
    fn emit(&mut self, expr: &Arc<Expr>) -> Result<String> {
        match &**expr {
            Expr::Const(v) => Ok(float_literal(*v)),
            Expr::Coord(c) => Ok(c.name().to_string()),
            Expr::Input(name) => Err(Error::UnresolvedInput(name.clone())),
            Expr::Vec3(_) => Err(Error::Unsupported(
                "vector value in scalar position".to_string(),
            )),
            Expr::Unary(op, a) => {
                if let Some(name) = self.cse.get(expr) {
                    return Ok(name.clone());
                }
                let a = self.emit(a)?;
                let rhs = unary_c(*op, &a);
                Ok(self.define(expr.clone(), &rhs))
            }
            Expr::Binary(op, a, b) => {
                if let Some(name) = self.cse.get(expr) {
                    return Ok(name.clone());
                }
                let a = self.emit(a)?;
                let b = self.emit(b)?;
                let rhs = binary_c(*op, &a, &b);
                Ok(self.define(expr.clone(), &rhs))
            }
        }
    }

    fn define(&mut self, expr: Arc<Expr>, rhs: &str) -> String {
        let name = format!("v{}", self.var_counter);
        self.var_counter += 1;
        writeln!(self.code, "  const double {name} = {rhs};").unwrap();
        self.cse.insert(expr, name.clone());
        name
    }
}

/// A C literal reproducing the exact f64. 17 significant digits
/// round-trip every double; non-finite values use the math.h macros.
/// The negative infinity form is parenthesized so it can follow a
/// minus sign without forming `--`.
fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "NAN".to_string()
    } else if v == f64::INFINITY {
        "INFINITY".to_string()
    } else if v == f64::NEG_INFINITY {
        "(-INFINITY)".to_string()
    } else {
        format!("{v:.17e}")
    }
}

/// Negation wraps its operand in parentheses so a negated temporary
/// after a minus never lexes as `--`.
fn unary_c(op: UnaryOp, a: &str) -> String {
    match op {
        UnaryOp::Neg => format!("-({a})"),
        UnaryOp::Abs => format!("fabs({a})"),
        UnaryOp::Sqrt => format!("sqrt({a})"),
        UnaryOp::Sin => format!("sin({a})"),
        UnaryOp::Cos => format!("cos({a})"),
        UnaryOp::Floor => format!("floor({a})"),
        UnaryOp::Ceil => format!("ceil({a})"),
    }
}

fn binary_c(op: BinaryOp, a: &str, b: &str) -> String {
    match op {
        BinaryOp::Add => format!("({a} + {b})"),
        BinaryOp::Sub => format!("({a} - {b})"),
        BinaryOp::Mul => format!("({a} * {b})"),
        BinaryOp::Div => format!("({a} / {b})"),
        BinaryOp::Min => format!("fmin({a}, {b})"),
        BinaryOp::Max => format!("fmax({a}, {b})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lostwax_field::expr::{add, length3, sub};
    use lostwax_field::{BoundingBox, Coord};

    fn sphere_shape(radius: f64) -> Shape {
        let x = Expr::coord(Coord::X);
        let y = Expr::coord(Coord::Y);
        let z = Expr::coord(Coord::Z);
        Shape {
            bbox: BoundingBox::cube(radius),
            is_2d: false,
            is_3d: true,
            dist: sub(length3(x, y, z), Expr::num(radius)),
            colour: Arc::new(Expr::Vec3([
                Expr::num(0.8),
                Expr::num(0.8),
                Expr::num(0.8),
            ])),
        }
    }

    #[test]
    fn generates_both_entry_points() {
        let source = generate(&sphere_shape(1.0)).unwrap();
        assert!(source.contains("double dist_(double x, double y, double z, double t)"));
        assert!(source.contains("void colour_(double x, double y, double z, double t, double* out)"));
        assert!(source.contains("#include <math.h>"));
    }

    #[test]
    fn shared_subtrees_are_computed_once() {
        let x = Expr::coord(Coord::X);
        let y = Expr::coord(Coord::Y);
        let z = Expr::coord(Coord::Z);
        let len = length3(x, y, z);
        let mut shape = sphere_shape(1.0);
        // |p| appears twice but must generate one sqrt
        shape.dist = add(len.clone(), len);
        let source = generate(&shape).unwrap();
        assert_eq!(source.matches("sqrt(").count(), 1);
    }

    #[test]
    fn structurally_equal_subtrees_share_a_temporary() {
        let square = |c: Coord| {
            let v = Expr::coord(c);
            lostwax_field::expr::mul(v.clone(), v)
        };
        let mut shape = sphere_shape(1.0);
        // two separately built x*x trees still deduplicate
        shape.dist = add(square(Coord::X), square(Coord::X));
        let source = generate(&shape).unwrap();
        assert_eq!(source.matches("(x * x)").count(), 1);
    }

    #[test]
    fn constants_are_inlined_with_full_precision() {
        let source = generate(&sphere_shape(1.0)).unwrap();
        assert!(source.contains("1.00000000000000000e0"));
    }

    #[test]
    fn non_finite_constants_use_math_macros() {
        let mut shape = sphere_shape(1.0);
        shape.dist = add(
            Expr::num(f64::NAN),
            add(Expr::num(f64::INFINITY), Expr::num(f64::NEG_INFINITY)),
        );
        let source = generate(&shape).unwrap();
        assert!(source.contains("NAN"));
        assert!(source.contains("INFINITY"));
        assert!(source.contains("(-INFINITY)"));
    }

    #[test]
    fn negation_parenthesizes_its_operand() {
        let mut shape = sphere_shape(1.0);
        shape.dist = sub(
            Expr::coord(Coord::X),
            lostwax_field::expr::neg(Expr::coord(Coord::Y)),
        );
        let source = generate(&shape).unwrap();
        assert!(source.contains("-(y)"));
        assert!(!source.contains("--"));
    }

    #[test]
    fn unresolved_inputs_fail_generation() {
        let mut shape = sphere_shape(1.0);
        shape.dist = sub(shape.dist.clone(), Expr::input("radius"));
        let err = generate(&shape).unwrap_err();
        assert!(matches!(err, Error::UnresolvedInput(name) if name == "radius"));
    }

    #[test]
    fn scalar_colour_broadcasts_to_all_components() {
        let mut shape = sphere_shape(1.0);
        shape.colour = Expr::num(0.25);
        let source = generate(&shape).unwrap();
        assert!(source.contains("out[0] = 2.50000000000000000e-1;"));
        assert!(source.contains("out[1] = 2.50000000000000000e-1;"));
        assert!(source.contains("out[2] = 2.50000000000000000e-1;"));
    }
}
