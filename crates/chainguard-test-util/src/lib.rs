//! Shared test utilities for the chainguard workspace.
//!
//! `xtask` needs `normalize_nondeterministic` at runtime, so it cannot live
//! behind `#[cfg(test)]` in `chainguard-types`. Signing fixtures sit behind the
//! `crypto-fixtures` feature so that runtime users do not pull in key material.

use serde_json::Value;

#[cfg(feature = "crypto-fixtures")]
pub mod signing;

const ENVELOPE_KEYS: [&str; 5] = ["schema", "tool", "run", "decision", "verdicts"];
const TIMESTAMP_KEYS: [&str; 2] = ["started_at", "ended_at"];

/// Normalize non-deterministic report fields for golden-file comparison.
///
/// `tool.version` is replaced with `"__VERSION__"` only when the root object is
/// a report envelope. Run timestamps and `duration_ms` are normalized at any
/// depth since their placeholders cannot collide with verdict content.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut()
        && ENVELOPE_KEYS.iter().all(|k| obj.contains_key(*k))
        && let Some(tool) = obj.get_mut("tool").and_then(Value::as_object_mut)
        && tool.contains_key("version")
    {
        tool.insert(
            "version".to_string(),
            Value::String("__VERSION__".to_string()),
        );
    }
    normalize_run_fields(&mut value);
    value
}

fn normalize_run_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in TIMESTAMP_KEYS {
                if map.contains_key(key) {
                    map.insert(key.to_string(), Value::String("__TIMESTAMP__".to_string()));
                }
            }
            if map.contains_key("duration_ms") {
                map.insert("duration_ms".to_string(), Value::Number(0.into()));
            }
            for val in map.values_mut() {
                normalize_run_fields(val);
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(normalize_run_fields),
        _ => {}
    }
}
