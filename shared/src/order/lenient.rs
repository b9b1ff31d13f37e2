//! Lenient field decoding
//!
//! Numeric and text fields come from hand-typed form input and from older
//! device data. A value that cannot be read as the expected type becomes the
//! zero value instead of failing the whole record.

use super::types::OrderFlags;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value to `f64`; unparsable or non-finite input is `0.0`.
///
/// Strings are trimmed and a single decimal comma is accepted (`"12,5"`).
pub fn coerce_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replacen(',', ".", 1).parse::<f64>().ok())
}

/// Coerce a JSON value to `i64` (millisecond timestamps); anything else is `0`.
pub fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| parse_decimal(s).map(|v| v as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Coerce a JSON value to text; numbers keep their textual form, null is empty.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Truthiness used for flags stored by older clients (`1`, `"true"`).
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Value::deserialize(d).map(|v| coerce_f64(&v))
}

pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Value::deserialize(d).map(|v| coerce_i64(&v))
}

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Value::deserialize(d).map(|v| coerce_string(&v))
}

pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Value::deserialize(d).map(|v| coerce_bool(&v))
}

/// Anything that is not an array becomes an empty list.
pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    Value::deserialize(d).map(|v| match v {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

/// Flags object; `null` or any non-object becomes the default flags.
pub fn flags<'de, D: Deserializer<'de>>(d: D) -> Result<OrderFlags, D::Error> {
    Value::deserialize(d).map(coerce_flags)
}

/// An object keeps every key it carries; anything else is the default flags.
pub fn coerce_flags(value: Value) -> OrderFlags {
    match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => OrderFlags::default(),
    }
}

pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Value::deserialize(d).map(|v| Some(coerce_f64(&v)))
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Value::deserialize(d).map(|v| Some(coerce_string(&v)))
}

pub fn opt_flags<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OrderFlags>, D::Error> {
    flags(d).map(Some)
}

pub fn opt_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Value>>, D::Error> {
    list(d).map(Some)
}
