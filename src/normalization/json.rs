//! Safe access and text rendering for loosely-shaped API payloads.
//!
//! Every accessor here is total: a missing key, a `null`, or a value of the
//! wrong type collapses to the shared [`NULL`] sentinel instead of failing, so
//! extraction code can chain lookups without checking each level.

use serde_json::Value;

/// Shared "absent" sentinel returned by [`ValueExt::field`].
pub static NULL: Value = Value::Null;

pub trait ValueExt {
    /// Child value under `key`, or `Null` when `self` is not an object or the key is missing.
    fn field(&self, key: &str) -> &Value;

    /// Numeric identifier; accepts integers and strings holding an integer.
    fn as_id(&self) -> Option<i64>;
}

impl ValueExt for Value {
    fn field(&self, key: &str) -> &Value {
        self.as_object()
            .and_then(|m| m.get(key))
            .unwrap_or(&NULL)
    }

    fn as_id(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| f as i64)
                }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Literal rendering used inside `k:v` strings.
///
/// `null` renders as `None` and booleans as `True`/`False`, matching the text
/// the marketplace exports already carry; numbers keep their JSON form.
pub fn render_value(v: &Value) -> String {
    match v {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}

/// Rendering for a CSV cell: `null` is an empty cell, everything else as in [`render_value`].
pub fn render_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        other => render_value(other),
    }
}

/// Join pairs as `k1:v1; k2:v2` in the given order. Null values are kept.
pub fn fmt_kv(pairs: &[(&str, Value)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}:{}", render_value(v)))
        .collect::<Vec<_>>()
        .join("; ")
}

/// [`fmt_kv`] over `keys` looked up in `obj`.
pub fn fmt_fields(obj: &Value, keys: &[&str]) -> String {
    let pairs: Vec<(&str, Value)> = keys.iter().map(|k| (*k, obj.field(k).clone())).collect();
    fmt_kv(&pairs)
}
