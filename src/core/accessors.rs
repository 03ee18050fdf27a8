//! Tolerant field extraction from raw exchange payloads.
//!
//! Every accessor returns `None` when the key is missing, the value is
//! `null`, or it cannot be coerced to the requested type. Parsers combine
//! them with `unwrap_or` / `or` to supply their own defaults, so a malformed
//! field never aborts parsing a whole response.

use serde_json::Value;

/// One key or an ordered list of candidate keys; the first usable value wins
pub trait FieldKey {
    fn candidates(&self) -> &[&str];
}

impl<'a> FieldKey for &'a str {
    fn candidates(&self) -> &[&str] {
        std::slice::from_ref(self)
    }
}

impl<'a, const N: usize> FieldKey for [&'a str; N] {
    fn candidates(&self) -> &[&str] {
        self
    }
}

impl<'a> FieldKey for &[&'a str] {
    fn candidates(&self) -> &[&str] {
        self
    }
}

fn first_usable<K, T>(record: &Value, key: K, coerce: impl Fn(&Value) -> Option<T>) -> Option<T>
where
    K: FieldKey,
{
    key.candidates()
        .iter()
        .filter_map(|k| record.get(*k))
        .find_map(coerce)
}

/// The raw value under `key`, skipping `null`
pub fn safe_value<'a, K: FieldKey>(record: &'a Value, key: K) -> Option<&'a Value> {
    key.candidates()
        .iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

/// Strings as-is, numbers and booleans stringified
pub fn safe_string<K: FieldKey>(record: &Value, key: K) -> Option<String> {
    first_usable(record, key, value_to_string)
}

/// Numbers, or strings holding a finite number
pub fn safe_float<K: FieldKey>(record: &Value, key: K) -> Option<f64> {
    first_usable(record, key, value_to_f64)
}

/// Integers, integral-valued floats truncated, or numeric strings
pub fn safe_integer<K: FieldKey>(record: &Value, key: K) -> Option<i64> {
    first_usable(record, key, value_to_i64)
}

/// Seconds since epoch converted to milliseconds.
///
/// Only a value that is a valid number is scaled; anything else yields `None`.
pub fn safe_timestamp<K: FieldKey>(record: &Value, key: K) -> Option<i64> {
    safe_float(record, key).map(seconds_to_millis)
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// ISO-8601 rendering with millisecond precision, e.g. `2019-03-23T11:41:37.000Z`
pub fn iso8601(timestamp_ms: Option<i64>) -> Option<String> {
    let millis = timestamp_ms?;
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}
