//! Small helpers shared across resource codecs.

use serde_json::{Map, Value};

/// Merge `fragment` into `base` without overwriting keys already present.
///
/// Multiple block codecs contribute to the same flat payload; a key set by
/// an earlier block must never be clobbered by a later one.
pub fn merge(base: &mut Map<String, Value>, fragment: Map<String, Value>) {
    for (key, value) in fragment {
        base.entry(key).or_insert(value);
    }
}

/// Whether a value is the empty equivalent of its type: null, `false`, `0`,
/// `""`, `[]`, or `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Look up a dotted path within a JSON value.
///
/// Numeric segments index into arrays, so `http_check.0.timeout` resolves
/// the `timeout` attribute of the first `http_check` block.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
