//! Field expression graphs
//!
//! A field is a function of the four evaluator arguments `(x, y, z, t)`.
//! Graphs are immutable trees of [`Expr`] nodes with `Arc` children, so
//! shared subtrees are cheap to reuse and survive cloning. Equality and
//! hashing are structural: two graphs are equal when their operators and
//! operands are recursively equal, with `f64` leaves compared by bit
//! pattern. That identity keys the deduplication table during code
//! generation, so a subtree built once and reused generates code once.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::mem::discriminant;
use std::sync::Arc;

/// The four arguments of a field function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coord {
    X,
    Y,
    Z,
    T,
}

impl Coord {
    /// The argument name as it appears in generated source.
    pub fn name(self) -> &'static str {
        match self {
            Coord::X => "x",
            Coord::Y => "y",
            Coord::Z => "z",
            Coord::T => "t",
        }
    }
}

/// Unary operators on scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Abs,
    Sqrt,
    Sin,
    Cos,
    Floor,
    Ceil,
}

/// Binary operators on scalar fields.
///
/// `Min`/`Max` use the IEEE NaN-ignoring semantics of [`f64::min`] and
/// [`f64::max`]; generated C uses `fmin`/`fmax`, which match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

/// Apply a unary operator to a concrete value.
///
/// This is the single definition of the operator's numerics: the
/// interpreter, constant folding and eager value arithmetic all go
/// through it, so they cannot disagree.
pub fn apply_unary(op: UnaryOp, a: f64) -> f64 {
    match op {
        UnaryOp::Neg => -a,
        UnaryOp::Abs => a.abs(),
        UnaryOp::Sqrt => a.sqrt(),
        UnaryOp::Sin => a.sin(),
        UnaryOp::Cos => a.cos(),
        UnaryOp::Floor => a.floor(),
        UnaryOp::Ceil => a.ceil(),
    }
}

/// Apply a binary operator to concrete values. See [`apply_unary`].
pub fn apply_binary(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Min => a.min(b),
        BinaryOp::Max => a.max(b),
    }
}

/// A node in a field expression graph.
///
/// `Input` names a free reactive input that must be resolved before the
/// graph can be evaluated or compiled. `Vec3` is the vector constructor
/// and is only well formed at the root of a colour graph; everything
/// below it is scalar.
#[derive(Debug, Clone)]
pub enum Expr {
    Const(f64),
    Coord(Coord),
    Input(String),
    Unary(UnaryOp, Arc<Expr>),
    Binary(BinaryOp, Arc<Expr>, Arc<Expr>),
    Vec3([Arc<Expr>; 3]),
}

impl Expr {
    /// A constant leaf.
    pub fn num(v: f64) -> Arc<Expr> {
        Arc::new(Expr::Const(v))
    }

    /// One of the four evaluator arguments.
    pub fn coord(c: Coord) -> Arc<Expr> {
        Arc::new(Expr::Coord(c))
    }

    /// A free reactive input.
    pub fn input(name: impl Into<String>) -> Arc<Expr> {
        Arc::new(Expr::Input(name.into()))
    }

    /// Evaluate a scalar graph at a point.
    ///
    /// Graphs are validated input-free before evaluation; a stray input
    /// or vector constructor reads as NaN rather than panicking.
    pub fn eval(&self, x: f64, y: f64, z: f64, t: f64) -> f64 {
        match self {
            Expr::Const(v) => *v,
            Expr::Coord(Coord::X) => x,
            Expr::Coord(Coord::Y) => y,
            Expr::Coord(Coord::Z) => z,
            Expr::Coord(Coord::T) => t,
            Expr::Input(_) | Expr::Vec3(_) => f64::NAN,
            Expr::Unary(op, a) => apply_unary(*op, a.eval(x, y, z, t)),
            Expr::Binary(op, a, b) => {
                apply_binary(*op, a.eval(x, y, z, t), b.eval(x, y, z, t))
            }
        }
    }

    /// Evaluate a colour graph at a point. Scalar roots broadcast.
    pub fn eval_vec3(&self, x: f64, y: f64, z: f64, t: f64) -> glam::DVec3 {
        match self {
            Expr::Vec3([r, g, b]) => glam::DVec3::new(
                r.eval(x, y, z, t),
                g.eval(x, y, z, t),
                b.eval(x, y, z, t),
            ),
            scalar => glam::DVec3::splat(scalar.eval(x, y, z, t)),
        }
    }

    /// True for a vector-valued root.
    pub fn is_vector(&self) -> bool {
        matches!(self, Expr::Vec3(_))
    }

    /// Collect the names of all free reactive inputs into `out`.
    pub fn collect_inputs(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Const(_) | Expr::Coord(_) => {}
            Expr::Input(name) => {
                out.insert(name.clone());
            }
            Expr::Unary(_, a) => a.collect_inputs(out),
            Expr::Binary(_, a, b) => {
                a.collect_inputs(out);
                b.collect_inputs(out);
            }
            Expr::Vec3(parts) => {
                for p in parts {
                    p.collect_inputs(out);
                }
            }
        }
    }

    /// The set of free reactive inputs this graph depends on.
    pub fn free_inputs(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_inputs(&mut out);
        out
    }
}

fn arc_eq(a: &Arc<Expr>, b: &Arc<Expr>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Const(a), Expr::Const(b)) => a.to_bits() == b.to_bits(),
            (Expr::Coord(a), Expr::Coord(b)) => a == b,
            (Expr::Input(a), Expr::Input(b)) => a == b,
            (Expr::Unary(oa, a), Expr::Unary(ob, b)) => oa == ob && arc_eq(a, b),
            (Expr::Binary(oa, a0, a1), Expr::Binary(ob, b0, b1)) => {
                oa == ob && arc_eq(a0, b0) && arc_eq(a1, b1)
            }
            (Expr::Vec3(a), Expr::Vec3(b)) => {
                a.iter().zip(b.iter()).all(|(x, y)| arc_eq(x, y))
            }
            _ => false,
        }
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
        match self {
            Expr::Const(v) => v.to_bits().hash(state),
            Expr::Coord(c) => c.hash(state),
            Expr::Input(name) => name.hash(state),
            Expr::Unary(op, a) => {
                op.hash(state);
                a.hash(state);
            }
            Expr::Binary(op, a, b) => {
                op.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Expr::Vec3(parts) => {
                for p in parts {
                    p.hash(state);
                }
            }
        }
    }
}

// Graph builders. Formula code reads better with free functions than
// with Arc::new(Expr::Binary(..)) at every step.

pub fn add(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Binary(BinaryOp::Add, a, b))
}

pub fn sub(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Binary(BinaryOp::Sub, a, b))
}

pub fn mul(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Binary(BinaryOp::Mul, a, b))
}

pub fn div(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Binary(BinaryOp::Div, a, b))
}

pub fn min(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Binary(BinaryOp::Min, a, b))
}

pub fn max(a: Arc<Expr>, b: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Binary(BinaryOp::Max, a, b))
}

pub fn neg(a: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary(UnaryOp::Neg, a))
}

pub fn abs(a: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary(UnaryOp::Abs, a))
}

pub fn sqrt(a: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary(UnaryOp::Sqrt, a))
}

pub fn sin(a: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary(UnaryOp::Sin, a))
}

pub fn cos(a: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary(UnaryOp::Cos, a))
}

pub fn floor(a: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary(UnaryOp::Floor, a))
}

pub fn ceil(a: Arc<Expr>) -> Arc<Expr> {
    Arc::new(Expr::Unary(UnaryOp::Ceil, a))
}

/// `a * a` with the operand shared, so it deduplicates in generated code.
pub fn square(a: Arc<Expr>) -> Arc<Expr> {
    mul(a.clone(), a)
}

/// Euclidean length of a 2-vector.
pub fn length2(x: Arc<Expr>, y: Arc<Expr>) -> Arc<Expr> {
    sqrt(add(square(x), square(y)))
}

/// Euclidean length of a 3-vector.
pub fn length3(x: Arc<Expr>, y: Arc<Expr>, z: Arc<Expr>) -> Arc<Expr> {
    sqrt(add(add(square(x), square(y)), square(z)))
}

/// `min(max(v, lo), hi)`.
pub fn clamp(v: Arc<Expr>, lo: Arc<Expr>, hi: Arc<Expr>) -> Arc<Expr> {
    min(max(v, lo), hi)
}

/// Linear blend `a + (b - a) * t`.
pub fn mix(a: Arc<Expr>, b: Arc<Expr>, t: Arc<Expr>) -> Arc<Expr> {
    add(a.clone(), mul(sub(b, a), t))
}

/// Bindings for reactive inputs.
///
/// A binding maps an input name to an expression; binding `time` to the
/// `t` coordinate is how time-varying values reach the fixed
/// `(x, y, z, t)` evaluator signature.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Arc<Expr>>,
}

impl Environment {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment with `time` bound to the `t` coordinate.
    pub fn with_time() -> Self {
        let mut env = Self::new();
        env.bind("time", Expr::coord(Coord::T));
        env
    }

    /// Bind an input to an expression.
    pub fn bind(&mut self, name: impl Into<String>, value: Arc<Expr>) {
        self.bindings.insert(name.into(), value);
    }

    /// Bind an input to a number.
    pub fn bind_num(&mut self, name: impl Into<String>, value: f64) {
        self.bind(name, Expr::num(value));
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Arc<Expr>> {
        self.bindings.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Substitute bound inputs and fold constant subtrees.
///
/// Folding uses [`apply_unary`]/[`apply_binary`], so a folded constant
/// is exactly what the interpreter would have computed. Subtrees the
/// substitution does not touch keep their original `Arc`s, preserving
/// sharing.
pub fn resolve(expr: &Arc<Expr>, env: &Environment) -> Arc<Expr> {
    match &**expr {
        Expr::Const(_) | Expr::Coord(_) => expr.clone(),
        Expr::Input(name) => match env.get(name) {
            Some(binding) => binding.clone(),
            None => expr.clone(),
        },
        Expr::Unary(op, a) => {
            let ra = resolve(a, env);
            if let Expr::Const(v) = &*ra {
                Expr::num(apply_unary(*op, *v))
            } else if Arc::ptr_eq(&ra, a) {
                expr.clone()
            } else {
                Arc::new(Expr::Unary(*op, ra))
            }
        }
        Expr::Binary(op, a, b) => {
            let ra = resolve(a, env);
            let rb = resolve(b, env);
            if let (Expr::Const(va), Expr::Const(vb)) = (&*ra, &*rb) {
                Expr::num(apply_binary(*op, *va, *vb))
            } else if Arc::ptr_eq(&ra, a) && Arc::ptr_eq(&rb, b) {
                expr.clone()
            } else {
                Arc::new(Expr::Binary(*op, ra, rb))
            }
        }
        Expr::Vec3(parts) => {
            let resolved = [
                resolve(&parts[0], env),
                resolve(&parts[1], env),
                resolve(&parts[2], env),
            ];
            if resolved
                .iter()
                .zip(parts.iter())
                .all(|(r, p)| Arc::ptr_eq(r, p))
            {
                expr.clone()
            } else {
                Arc::new(Expr::Vec3(resolved))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(e: &Expr) -> u64 {
        let mut h = DefaultHasher::new();
        e.hash(&mut h);
        h.finish()
    }

    fn sphere_dist(r: f64) -> Arc<Expr> {
        sub(
            length3(
                Expr::coord(Coord::X),
                Expr::coord(Coord::Y),
                Expr::coord(Coord::Z),
            ),
            Expr::num(r),
        )
    }

    #[test]
    fn structural_equality_and_hash() {
        let a = sphere_dist(1.5);
        let b = sphere_dist(1.5);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = sphere_dist(2.0);
        assert_ne!(*a, *c);
    }

    #[test]
    fn constants_compare_by_bits() {
        assert_eq!(Expr::Const(f64::NAN), Expr::Const(f64::NAN));
        assert_ne!(Expr::Const(0.0), Expr::Const(-0.0));
    }

    #[test]
    fn shared_subtrees_equal_rebuilt_ones() {
        let x = Expr::coord(Coord::X);
        let shared = square(x.clone());
        let rebuilt = mul(Expr::coord(Coord::X), Expr::coord(Coord::X));
        assert_eq!(*shared, *rebuilt);
    }

    #[test]
    fn eval_matches_closed_form() {
        let d = sphere_dist(1.0);
        assert_relative_eq!(d.eval(2.0, 0.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(d.eval(0.0, 0.0, 0.0, 0.0), -1.0);
        let p = 3.0_f64.sqrt() / 3.0;
        assert_relative_eq!(d.eval(p, p, p, 0.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn eval_propagates_specials() {
        let one_over_y = div(Expr::num(1.0), Expr::coord(Coord::Y));
        assert_eq!(one_over_y.eval(0.0, 0.0, 0.0, 0.0), f64::INFINITY);

        let x_over_y = div(Expr::coord(Coord::X), Expr::coord(Coord::Y));
        assert!(x_over_y.eval(0.0, 0.0, 0.0, 0.0).is_nan());

        // IEEE min ignores a NaN operand
        let m = min(x_over_y, Expr::num(1.0));
        assert_eq!(m.eval(0.0, 0.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn free_inputs_are_collected_in_order() {
        let e = add(
            mul(Expr::input("radius"), Expr::input("amp")),
            Expr::input("amp"),
        );
        let names: Vec<String> = e.free_inputs().into_iter().collect();
        assert_eq!(names, vec!["amp".to_string(), "radius".to_string()]);
    }

    #[test]
    fn resolve_substitutes_and_folds() {
        let e = mul(Expr::input("r"), Expr::num(3.0));
        let mut env = Environment::new();
        env.bind_num("r", 2.0);
        let r = resolve(&e, &env);
        match &*r {
            Expr::Const(v) => assert_relative_eq!(*v, 6.0),
            other => panic!("expected folded constant, got {other:?}"),
        }
    }

    #[test]
    fn resolve_keeps_unbound_inputs() {
        let e = mul(Expr::input("r"), Expr::num(3.0));
        let r = resolve(&e, &Environment::new());
        assert_eq!(r.free_inputs().len(), 1);
        assert_eq!(*r, *e);
    }

    #[test]
    fn resolve_binds_time_to_coordinate() {
        let e = add(Expr::coord(Coord::X), Expr::input("time"));
        let r = resolve(&e, &Environment::with_time());
        assert!(r.free_inputs().is_empty());
        assert_relative_eq!(r.eval(1.0, 0.0, 0.0, 0.5), 1.5);
    }

    #[test]
    fn folding_matches_interpreter_on_specials() {
        // 1/0 folds to the same infinity the interpreter produces
        let e = div(Expr::num(1.0), Expr::num(0.0));
        let r = resolve(&e, &Environment::new());
        match &*r {
            Expr::Const(v) => assert_eq!(*v, f64::INFINITY),
            other => panic!("expected folded constant, got {other:?}"),
        }
    }
}
