//! Numeric shape parameters
//!
//! A parameter is a JSON number, an `{"input": name}` reference, or an
//! arithmetic object combining other parameters. Parsing resolves the
//! result against the caller's environment immediately, so bound inputs
//! collapse to concrete numbers while anything else stays deferred.

use crate::error::{Error, Result};
use lostwax_field::{Environment, Value};
use serde_json::Value as Json;

/// Parse one parameter and resolve it against the environment.
pub fn parse_param(name: &'static str, json: &Json, env: &Environment) -> Result<Value> {
    Ok(parse_value(name, json)?.resolve(env))
}

/// Parse a three-element array of scalar parameters.
pub fn parse_triple(name: &'static str, json: &Json, env: &Environment) -> Result<[Value; 3]> {
    let Json::Array(items) = json else {
        return Err(param_error(name, "expected an array of three values"));
    };
    if items.len() != 3 {
        return Err(param_error(name, "expected an array of three values"));
    }
    Ok([
        parse_param(name, &items[0], env)?,
        parse_param(name, &items[1], env)?,
        parse_param(name, &items[2], env)?,
    ])
}

fn parse_value(name: &'static str, json: &Json) -> Result<Value> {
    match json {
        Json::Number(n) => n
            .as_f64()
            .map(Value::Num)
            .ok_or_else(|| param_error(name, "number is out of range")),
        Json::Object(map) => {
            let mut entries = map.iter();
            let (Some((op, arg)), None) = (entries.next(), entries.next()) else {
                return Err(param_error(name, "expected a single operation"));
            };
            match op.as_str() {
                "input" => match arg {
                    Json::String(s) => Ok(Value::input(s.clone())),
                    _ => Err(param_error(name, "`input` expects a name")),
                },
                "add" | "sub" | "mul" | "div" | "min" | "max" => {
                    let (a, b) = binary_args(name, op, arg)?;
                    let a = parse_value(name, a)?;
                    let b = parse_value(name, b)?;
                    Ok(match op.as_str() {
                        "add" => a.add(&b)?,
                        "sub" => a.sub(&b)?,
                        "mul" => a.mul(&b)?,
                        "div" => a.div(&b)?,
                        "min" => a.min(&b)?,
                        _ => a.max(&b)?,
                    })
                }
                "neg" | "abs" | "sqrt" | "sin" | "cos" => {
                    let a = parse_value(name, arg)?;
                    Ok(match op.as_str() {
                        "neg" => a.neg()?,
                        "abs" => a.abs()?,
                        "sqrt" => a.sqrt()?,
                        "sin" => a.sin()?,
                        _ => a.cos()?,
                    })
                }
                other => Err(param_error(name, &format!("unknown operation `{other}`"))),
            }
        }
        _ => Err(param_error(name, "expected a number or an operation object")),
    }
}

fn binary_args<'a>(name: &'static str, op: &str, arg: &'a Json) -> Result<(&'a Json, &'a Json)> {
    match arg {
        Json::Array(items) if items.len() == 2 => Ok((&items[0], &items[1])),
        _ => Err(param_error(name, &format!("`{op}` expects two operands"))),
    }
}

/// The concrete number a bounding parameter takes at time zero.
///
/// Parameters may vary with time, but the bounding box is computed for
/// the static frame. Dependence on any other unresolved input cannot be
/// bounded and is an error.
pub fn bound_at_t0(name: &'static str, value: &Value) -> Result<f64> {
    match value {
        Value::Num(v) => Ok(*v),
        Value::Vec(_) => Err(param_error(name, "expected a scalar value")),
        Value::Reactive(r) => {
            if let Some(input) = r.deps().iter().next() {
                return Err(Error::UnresolvedInput(input.clone()));
            }
            Ok(r.expr().eval(0.0, 0.0, 0.0, 0.0))
        }
    }
}

pub(crate) fn param_error(name: &str, reason: &str) -> Error {
    Error::Parameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn numbers_parse_concrete() {
        let env = Environment::new();
        let v = parse_param("radius", &json!(2.5), &env).unwrap();
        assert_eq!(v.as_num(), Some(2.5));
    }

    #[test]
    fn arithmetic_folds_eagerly() {
        let env = Environment::new();
        let v = parse_param("radius", &json!({"div": [1, 2]}), &env).unwrap();
        assert_eq!(v.as_num(), Some(0.5));
        let v = parse_param("radius", &json!({"max": [{"neg": 3}, 1]}), &env).unwrap();
        assert_eq!(v.as_num(), Some(1.0));
    }

    #[test]
    fn bound_inputs_resolve_to_numbers() {
        let mut env = Environment::new();
        env.bind_num("r", 1.5);
        let v = parse_param("radius", &json!({"mul": [{"input": "r"}, 2]}), &env).unwrap();
        assert_eq!(v.as_num(), Some(3.0));
    }

    #[test]
    fn unbound_inputs_stay_deferred() {
        let env = Environment::new();
        let v = parse_param("radius", &json!({"input": "r"}), &env).unwrap();
        assert!(!v.is_concrete());
        assert!(v.free_inputs().contains("r"));
    }

    #[test]
    fn time_dependent_bounds_evaluate_at_time_zero() {
        let env = Environment::with_time();
        let v = parse_param(
            "radius",
            &json!({"add": [1, {"mul": [0.5, {"cos": {"input": "time"}}]}]}),
            &env,
        )
        .unwrap();
        assert!(!v.is_concrete());
        // cos(0) = 1, so the static frame sees 1.5
        assert_relative_eq!(bound_at_t0("radius", &v).unwrap(), 1.5);
    }

    #[test]
    fn unresolved_bounds_are_rejected() {
        let env = Environment::new();
        let v = parse_param("radius", &json!({"input": "r"}), &env).unwrap();
        let err = bound_at_t0("radius", &v).unwrap_err();
        assert!(matches!(err, Error::UnresolvedInput(name) if name == "r"));
    }

    #[test]
    fn malformed_parameters_are_rejected() {
        let env = Environment::new();
        assert!(parse_param("radius", &json!("two"), &env).is_err());
        assert!(parse_param("radius", &json!({"add": [1]}), &env).is_err());
        assert!(parse_param("radius", &json!({"warp": 1}), &env).is_err());
        assert!(parse_triple("size", &json!([1, 2]), &env).is_err());
    }
}
