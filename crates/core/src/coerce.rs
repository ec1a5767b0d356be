//! Lossy-but-safe conversions from untyped feed values into domain values.
//!
//! Partner feeds arrive as generic document trees where a quantity may be the
//! number `3`, the string `"3"`, or garbage. These helpers convert what can
//! be converted and return `None` for everything else - they never panic and
//! never error, so callers can treat `None` uniformly as a validation
//! failure.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

/// Convert a feed value into a non-negative integer.
///
/// Accepts integers `>= 0` and strings that parse as such. Floats are only
/// accepted when they carry no fractional part (`3.0` but not `3.7`).
/// Booleans, negatives, and non-numeric values yield `None`.
#[must_use]
pub fn to_positive_int(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                // Integral floats are fine; fractional ones are not an integer.
                let f = n.as_f64()?;
                if !f.is_finite() || f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64
                {
                    return None;
                }
                f as i64
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (n >= 0).then_some(n)
}

/// Convert a feed value into a fixed-point decimal.
///
/// Accepts finite numbers and strings that parse as `f64`; the conversion
/// goes through an `f64` intermediate, so precision is float64-equivalent
/// rather than arbitrary. Returns `None` for non-finite or non-numeric
/// input.
#[must_use]
pub fn to_decimal(value: &Value) -> Option<Decimal> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !f.is_finite() {
        return None;
    }
    Decimal::from_f64(f)
}

/// Convert a feed value into a non-negative fixed-point decimal.
///
/// Same conversion as [`to_decimal`], additionally rejecting negative
/// values. Used for prices.
#[must_use]
pub fn to_positive_decimal(value: &Value) -> Option<Decimal> {
    to_decimal(value).filter(|d| !d.is_sign_negative() || d.is_zero())
}
