//! Export option parsing
//!
//! Options arrive as `key` or `key=value` strings (the CLI's `-O`
//! flag). Unknown keys, unparsable numbers and out-of-range values all
//! raise the same recoverable parameter error naming the offending key
//! and value.

use crate::error::{Error, Result};

/// Tuning parameters for mesh export.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExportParams {
    /// Voxel size override. `None` picks the volume-based default.
    pub res: Option<f64>,
    /// Mesh simplification aggressiveness in `[0, 1]`.
    pub adaptivity: f64,
}

impl ExportParams {
    /// Parse a list of `key[=value]` option strings.
    ///
    /// `res=<v>` overrides the voxel size and must be positive.
    /// `adaptive[=<v>]` controls simplification: the bare flag means
    /// full simplification, absent means none.
    pub fn from_options<S: AsRef<str>>(options: &[S]) -> Result<Self> {
        let mut params = Self::default();
        for option in options {
            let option = option.as_ref();
            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (option, None),
            };
            match key {
                "res" => {
                    let text = value.ok_or_else(|| invalid(key, "", "expected a value"))?;
                    let res = parse_number(key, text)?;
                    if !res.is_finite() || res <= 0.0 {
                        return Err(invalid(key, text, "must be greater than 0"));
                    }
                    params.res = Some(res);
                }
                "adaptive" => {
                    params.adaptivity = match value {
                        None => 1.0,
                        Some(text) => {
                            let a = parse_number(key, text)?;
                            if !(0.0..=1.0).contains(&a) {
                                return Err(invalid(key, text, "must be in range 0...1"));
                            }
                            a
                        }
                    };
                }
                _ => return Err(invalid(key, value.unwrap_or(""), "unknown option")),
            }
        }
        Ok(params)
    }
}

fn parse_number(key: &str, text: &str) -> Result<f64> {
    match text.parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok(v),
        _ => Err(invalid(key, text, "expected a number")),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> Error {
    Error::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
