//! Pre-parse conversions for schemas built with `.coerce()`.
//!
//! A conversion that does not apply leaves the input untouched; the type check
//! that follows reports it.

use crate::primitives::NumberKind;
use crate::schema::Definition;
use crate::value::{Number, Value};

pub(crate) fn apply(def: &Definition, value: &mut Value) {
    let converted = match def {
        Definition::String => to_string(value),
        Definition::Number(kind) => to_number(value, *kind),
        Definition::BigInt => to_bigint(value),
        Definition::Bool => to_bool(value),
        _ => None,
    };
    if let Some(converted) = converted {
        *value = converted;
    }
}

fn to_string(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::BigInt(i) => Some(Value::String(i.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn to_number(value: &Value, kind: NumberKind) -> Option<Value> {
    let n = match value {
        Value::String(s) => parse_decimal(s.trim())?,
        Value::Bool(b) => Number::Int(i128::from(*b)),
        Value::BigInt(i) => Number::Int(*i),
        _ => return None,
    };
    let n = match (kind, n) {
        (NumberKind::Float32, n) => Number::Float(n.as_f64() as f32 as f64),
        (_, n) => n,
    };
    if let Some((min, max)) = kind.bounds() {
        if n.is_finite() && (n < min || n > max) {
            return None;
        }
    }
    Some(Value::Number(n))
}

/// Base-10 integers keep full precision; anything else goes through `f64`.
fn parse_decimal(s: &str) -> Option<Number> {
    match s {
        "" => None,
        "Infinity" | "+Infinity" => Some(Number::Float(f64::INFINITY)),
        "-Infinity" => Some(Number::Float(f64::NEG_INFINITY)),
        _ if !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) =>
        {
            None
        }
        _ => s
            .parse::<i128>()
            .map(Number::Int)
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(Number::Float)),
    }
}

fn to_bigint(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => s.trim().parse::<i128>().ok().map(Value::BigInt),
        Value::Number(n) => n.as_i128().map(Value::BigInt),
        Value::Bool(b) => Some(Value::BigInt(i128::from(*b))),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Bool(!n.is_nan() && n.as_f64() != 0.0)),
        Value::BigInt(i) => Some(Value::Bool(*i != 0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
            "false" | "0" | "no" | "off" | "" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}
