//! Request parameter maps and the deep-merge rule.
//!
//! # Design
//! Parameters are plain `serde_json` object maps, so anything a caller can
//! express in JSON can ride along on a request. [`merge_params`] combines a
//! type's default parameters with the caller's per-call values: the caller
//! wins scalar conflicts, lists concatenate defaults-then-caller, and nested
//! objects merge recursively with the caller winning at the leaves.

use serde_json::Value;

/// A JSON object, the shape of request parameters and of every decoded
/// response root.
pub type JsonObject = serde_json::Map<String, Value>;

/// Request parameters for a single call.
pub type Params = JsonObject;

/// Merge `overrides` into `base` and return the combined map.
///
/// Keys present on one side only are kept as-is. When both sides carry a
/// key:
/// - two arrays concatenate, `base` elements first;
/// - two objects merge recursively under the same rules;
/// - any other pairing resolves to the `overrides` value.
pub fn merge_params(base: Params, overrides: Params) -> Params {
    let mut merged = base;
    for (key, incoming) in overrides {
        let combined = match (merged.remove(&key), incoming) {
            (Some(Value::Array(mut existing)), Value::Array(extra)) => {
                existing.extend(extra);
                Value::Array(existing)
            }
            (Some(Value::Object(existing)), Value::Object(extra)) => {
                Value::Object(merge_params(existing, extra))
            }
            (_, incoming) => incoming,
        };
        merged.insert(key, combined);
    }
    merged
}

/// Text form of a parameter value for query strings and form parts: strings
/// are written bare, everything else as its JSON text.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
