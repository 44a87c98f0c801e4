//! Canonical JSON and the exact-cache `CacheKey` (spec.md §3).
//!
//! Arguments are parsed as JSON and re-emitted with lexicographically sorted
//! object keys at every depth, so two requests with JSON-equal arguments
//! produce bytewise-identical keys regardless of the original key order.

use serde_json::Value;

use crate::error::ToolGateError;

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Re-emit `input` with object keys sorted lexicographically at every depth.
pub fn canonical_json_bytes(input: &[u8]) -> Result<Vec<u8>, ToolGateError> {
    let value: Value = serde_json::from_slice(input)?;
    Ok(serde_json::to_vec(&canonicalize(&value))?)
}

/// Re-emit an already-parsed value in canonical form.
pub fn canonical_json_value(value: &Value) -> Value {
    canonicalize(value)
}

/// Derive the exact-cache key for `tool_name` and raw argument bytes.
///
/// Uses a NUL separator between the tool name and the canonical argument
/// bytes so no tool name / argument byte-sequence pair can collide with a
/// different pair.
pub fn cache_key(tool_name: &str, tool_inputs: &[u8]) -> Result<String, ToolGateError> {
    let canon = canonical_json_bytes(tool_inputs)?;
    let mut key = String::with_capacity(tool_name.len() + 1 + canon.len());
    key.push_str(tool_name);
    key.push('\0');
    key.push_str(&String::from_utf8_lossy(&canon));
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reordered_object_keys_produce_identical_canonical_bytes() {
        let a = br#"{"a":1,"b":2}"#;
        let b = br#"{"b":2,"a":1}"#;
        assert_eq!(canonical_json_bytes(a).unwrap(), canonical_json_bytes(b).unwrap());
    }

    #[test]
    fn nested_objects_are_sorted_recursively() {
        let a = br#"{"z":{"y":1,"x":2},"a":1}"#;
        let b = br#"{"a":1,"z":{"x":2,"y":1}}"#;
        assert_eq!(canonical_json_bytes(a).unwrap(), canonical_json_bytes(b).unwrap());
    }

    #[test]
    fn cache_key_determinism_across_key_order() {
        let a = cache_key("svc.t", br#"{"a":1,"b":2}"#).unwrap();
        let b = cache_key("svc.t", br#"{"b":2,"a":1}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_differs_across_tool_names() {
        let a = cache_key("svc.t1", br#"{"a":1}"#).unwrap();
        let b = cache_key("svc.t2", br#"{"a":1}"#).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn array_element_order_is_preserved_not_sorted() {
        let a = br#"{"list":[1,2,3]}"#;
        let b = br#"{"list":[3,2,1]}"#;
        assert_ne!(canonical_json_bytes(a).unwrap(), canonical_json_bytes(b).unwrap());
    }
}
