//! Reactive values
//!
//! A value is either concrete (a number or a vector) or deferred: an
//! expression graph still waiting on free inputs. Arithmetic is lazy by
//! contagion: any operation with a deferred operand composes a larger
//! deferred value, and eager evaluation happens only when every operand
//! is concrete. [`Value::resolve`] substitutes bound inputs and
//! collapses back to a concrete value when nothing deferred remains.

use crate::expr::{self, BinaryOp, Environment, Expr, UnaryOp, apply_binary, apply_unary};
use crate::{Error, Result};
use glam::DVec3;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The type a deferred value will produce once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Scalar,
    Vector,
}

/// An immutable deferred expression: the graph, the free inputs it
/// depends on, and the type it will produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactiveExpr {
    expr: Arc<Expr>,
    deps: BTreeSet<String>,
    ty: ValueType,
}

impl ReactiveExpr {
    pub fn new(expr: Arc<Expr>) -> Self {
        let deps = expr.free_inputs();
        let ty = if expr.is_vector() {
            ValueType::Vector
        } else {
            ValueType::Scalar
        };
        Self { expr, deps, ty }
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    pub fn deps(&self) -> &BTreeSet<String> {
        &self.deps
    }

    pub fn ty(&self) -> ValueType {
        self.ty
    }
}

impl std::hash::Hash for ReactiveExpr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // deps and ty are derived from the graph, so hashing the graph
        // alone keeps hash consistent with equality
        self.expr.hash(state);
    }
}

/// A value in the shape description model: concrete or deferred.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Vec(DVec3),
    Reactive(ReactiveExpr),
}

impl Value {
    /// Wrap an expression, collapsing constant roots to concrete values.
    pub fn from_expr(expr: Arc<Expr>) -> Value {
        match &*expr {
            Expr::Const(v) => Value::Num(*v),
            Expr::Vec3(parts) => {
                let nums: Vec<f64> = parts
                    .iter()
                    .filter_map(|p| match &**p {
                        Expr::Const(v) => Some(*v),
                        _ => None,
                    })
                    .collect();
                if let [x, y, z] = nums[..] {
                    Value::Vec(DVec3::new(x, y, z))
                } else {
                    Value::Reactive(ReactiveExpr::new(expr))
                }
            }
            _ => Value::Reactive(ReactiveExpr::new(expr)),
        }
    }

    /// A deferred reference to a named input.
    pub fn input(name: impl Into<String>) -> Value {
        Value::from_expr(Expr::input(name))
    }

    /// Build a vector from three scalar values. Deferred components
    /// produce a deferred vector.
    pub fn vec3(x: &Value, y: &Value, z: &Value) -> Result<Value> {
        if let (Value::Num(x), Value::Num(y), Value::Num(z)) = (x, y, z) {
            return Ok(Value::Vec(DVec3::new(*x, *y, *z)));
        }
        Ok(Value::from_expr(Arc::new(Expr::Vec3([
            x.scalar_expr()?,
            y.scalar_expr()?,
            z.scalar_expr()?,
        ]))))
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, Value::Reactive(_))
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(v) => Some(*v),
            _ => None,
        }
    }

    /// Free inputs this value depends on. Empty for concrete values.
    pub fn free_inputs(&self) -> BTreeSet<String> {
        match self {
            Value::Num(_) | Value::Vec(_) => BTreeSet::new(),
            Value::Reactive(r) => r.deps().clone(),
        }
    }

    /// The expression form of this value.
    pub fn to_expr(&self) -> Arc<Expr> {
        match self {
            Value::Num(v) => Expr::num(*v),
            Value::Vec(v) => Arc::new(Expr::Vec3([
                Expr::num(v.x),
                Expr::num(v.y),
                Expr::num(v.z),
            ])),
            Value::Reactive(r) => r.expr().clone(),
        }
    }

    /// The expression form, rejecting vectors.
    fn scalar_expr(&self) -> Result<Arc<Expr>> {
        match self {
            Value::Num(v) => Ok(Expr::num(*v)),
            Value::Vec(_) => Err(Error::TypeMismatch(
                "expected a scalar value, got a vector".to_string(),
            )),
            Value::Reactive(r) => match r.ty() {
                ValueType::Scalar => Ok(r.expr().clone()),
                ValueType::Vector => Err(Error::TypeMismatch(
                    "expected a scalar value, got a deferred vector".to_string(),
                )),
            },
        }
    }

    /// Substitute bound inputs, fold, and collapse to a concrete value
    /// when possible.
    pub fn resolve(&self, env: &Environment) -> Value {
        match self {
            Value::Num(_) | Value::Vec(_) => self.clone(),
            Value::Reactive(r) => Value::from_expr(expr::resolve(r.expr(), env)),
        }
    }

    fn unary(&self, op: UnaryOp) -> Result<Value> {
        match self {
            Value::Num(v) => Ok(Value::Num(apply_unary(op, *v))),
            _ => Ok(Value::from_expr(Arc::new(Expr::Unary(
                op,
                self.scalar_expr()?,
            )))),
        }
    }

    fn binary(&self, op: BinaryOp, other: &Value) -> Result<Value> {
        if let (Value::Num(a), Value::Num(b)) = (self, other) {
            return Ok(Value::Num(apply_binary(op, *a, *b)));
        }
        Ok(Value::from_expr(Arc::new(Expr::Binary(
            op,
            self.scalar_expr()?,
            other.scalar_expr()?,
        ))))
    }

    pub fn add(&self, other: &Value) -> Result<Value> {
        self.binary(BinaryOp::Add, other)
    }

    pub fn sub(&self, other: &Value) -> Result<Value> {
        self.binary(BinaryOp::Sub, other)
    }

    pub fn mul(&self, other: &Value) -> Result<Value> {
        self.binary(BinaryOp::Mul, other)
    }

    pub fn div(&self, other: &Value) -> Result<Value> {
        self.binary(BinaryOp::Div, other)
    }

    pub fn min(&self, other: &Value) -> Result<Value> {
        self.binary(BinaryOp::Min, other)
    }

    pub fn max(&self, other: &Value) -> Result<Value> {
        self.binary(BinaryOp::Max, other)
    }

    pub fn neg(&self) -> Result<Value> {
        self.unary(UnaryOp::Neg)
    }

    pub fn abs(&self) -> Result<Value> {
        self.unary(UnaryOp::Abs)
    }

    pub fn sqrt(&self) -> Result<Value> {
        self.unary(UnaryOp::Sqrt)
    }

    pub fn sin(&self) -> Result<Value> {
        self.unary(UnaryOp::Sin)
    }

    pub fn cos(&self) -> Result<Value> {
        self.unary(UnaryOp::Cos)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}
