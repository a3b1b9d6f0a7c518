//! Comparison semantics used by the assertion context
//!
//! - `strict_equal`: primitives by value, arrays/objects by identity
//! - `loose_equal`: coercive equality (`==` rules)
//! - `deep_equal`: structural recursion with strict leaves
//! - `deep_loose_equal`: structural recursion with loose leaves
//!
//! Values are immutable and instances can only reference values that existed
//! before them, so the structural walk never meets a cycle.

use crate::value::{format_number, Value, ValueArray, ValueObject};

/// Strict equality. Two distinct instances with the same contents are not equal.
pub fn strict_equal(a: &Value, b: &Value) -> bool {
    a.strict_equals(b)
}

/// Coercive equality.
///
/// `null == undefined`; numbers and strings compare numerically; booleans
/// become numbers first; an array or object compared to a primitive is
/// reduced to its primitive string form. NaN never equals anything.
pub fn loose_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => x.same_instance(y),
        (Value::Object(x), Value::Object(y)) => x.same_instance(y),
        (Value::Array(_), Value::Object(_)) | (Value::Object(_), Value::Array(_)) => false,
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (Value::Null | Value::Undefined, _) | (_, Value::Null | Value::Undefined) => false,
        (Value::Number(x), Value::String(s)) | (Value::String(s), Value::Number(x)) => {
            *x == string_to_number(s)
        }
        (Value::Bool(flag), other) | (other, Value::Bool(flag)) => {
            loose_equal(&Value::Number(bool_to_number(*flag)), other)
        }
        (composite @ (Value::Array(_) | Value::Object(_)), primitive)
        | (primitive, composite @ (Value::Array(_) | Value::Object(_))) => {
            loose_equal(&Value::string(to_primitive_string(composite)), primitive)
        }
    }
}

/// Structural equality with strict leaves; object key order is irrelevant.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    deep_compare(a, b, strict_equal)
}

/// Structural equality with loose leaves.
pub fn deep_loose_equal(a: &Value, b: &Value) -> bool {
    deep_compare(a, b, loose_equal)
}

fn deep_compare(a: &Value, b: &Value, leaf: fn(&Value, &Value) -> bool) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            x.same_instance(y) || arrays_equal(x, y, leaf)
        }
        (Value::Object(x), Value::Object(y)) => {
            x.same_instance(y) || objects_equal(x, y, leaf)
        }
        // A container never equals a primitive or a container of the other kind
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => leaf(a, b),
    }
}

fn arrays_equal(x: &ValueArray, y: &ValueArray, leaf: fn(&Value, &Value) -> bool) -> bool {
    x.len() == y.len()
        && x
            .iter()
            .zip(y.iter())
            .all(|(a, b)| deep_compare(a, b, leaf))
}

fn objects_equal(x: &ValueObject, y: &ValueObject, leaf: fn(&Value, &Value) -> bool) -> bool {
    x.len() == y.len()
        && x.iter().all(|(key, a)| match y.get(key) {
            Some(b) => deep_compare(a, b, leaf),
            None => false,
        })
}

fn bool_to_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// String to number conversion: surrounding whitespace is ignored, the empty
/// string is 0, hex literals and `Infinity` are understood, anything else
/// that does not parse is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return hex_to_number(hex);
    }

    // Rust's float parser also accepts "inf" and "nan" spellings
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Hex digits only (no sign, no separators); any length, folded into an f64
fn hex_to_number(digits: &str) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| c.to_digit(16).map(|d| acc * 16.0 + f64::from(d)))
        .unwrap_or(f64::NAN)
}

/// Primitive string form of a value, as used when a composite meets a primitive
/// in a loose comparison. Arrays join their elements with `,` (null and
/// undefined become empty); objects become `[object Object]`.
pub fn to_primitive_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.to_string(),
        Value::Array(arr) => arr
            .iter()
            .map(|item| match item {
                Value::Null | Value::Undefined => String::new(),
                other => to_primitive_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
