//! Lostwax Wire - newline-framed JSON subset for IPC
//!
//! Messages to an external consumer process are framed by literal
//! newlines, one JSON value per line, so no payload may contain a raw
//! newline. The encoding is a constrained JSON subset with two quirks a
//! general JSON library will not produce: a record field holding the
//! [`Value::Missing`] sentinel encodes as the fixed placeholder object
//! `{"\u0000":""}` instead of being omitted, and any value outside the
//! encodable set degrades to a diagnostic `{"\u0000":"<text>"}`. The
//! writer is total and never fails.
//!
//! ## Example
//!
//! ```rust
//! use lostwax_wire::{Value, write_message};
//!
//! let msg = Value::Record(vec![
//!     ("triangles".to_string(), Value::Num(96.0)),
//!     ("note".to_string(), Value::str("two\nlines")),
//! ]);
//! assert_eq!(
//!     write_message(&msg),
//!     "{\"triangles\":96,\"note\":\"two\\nlines\"}\n"
//! );
//! ```

// String writing is infallible, so .unwrap() is safe here
#![allow(clippy::unwrap_used)]

use std::fmt::Write;

/// Placeholder object marking a record field with no value.
const MISSING_FIELD: &str = r#"{"\u0000":""}"#;

/// A value in the constrained wire model.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
    /// Fields in insertion order. Keys are not deduplicated or sorted.
    Record(Vec<(String, Value)>),
    /// The distinguished "no value present" sentinel. Only meaningful
    /// as a record field; anywhere else it encodes via the fallback.
    Missing,
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }
}

/// Encode a value as wire text. Total over the whole value model.
pub fn write_value(value: &Value) -> String {
    let mut out = String::new();
    encode(&mut out, value);
    out
}

/// Encode a value and append the newline that frames one message.
pub fn write_message(value: &Value) -> String {
    let mut out = write_value(value);
    out.push('\n');
    out
}

fn encode(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Num(v) => encode_num(out, *v),
        Value::Str(s) => encode_str(out, s),
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode(out, item);
            }
            out.push(']');
        }
        Value::Record(fields) => {
            out.push('{');
            for (i, (key, field)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_str(out, key);
                out.push(':');
                if matches!(field, Value::Missing) {
                    out.push_str(MISSING_FIELD);
                } else {
                    encode(out, field);
                }
            }
            out.push('}');
        }
        Value::Missing => encode_fallback(out, "missing"),
    }
}

/// Finite numbers print in plain decimal. NaN and the infinities have
/// no JSON spelling and encode as null.
fn encode_num(out: &mut String, v: f64) {
    if v.is_finite() {
        write!(out, "{v}").unwrap();
    } else {
        out.push_str("null");
    }
}

/// Backslash and double quote take a backslash escape; a literal
/// newline becomes the two characters `\n` so no message spans frames.
/// Everything else passes through untouched.
fn encode_str(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn encode_fallback(out: &mut String, text: &str) {
    out.push_str(r#"{"\u0000":"#);
    encode_str(out, text);
    out.push('}');
}
