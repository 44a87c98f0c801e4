use serde_json::Value;

use crate::patterns::{builtin_patterns, compile_custom_patterns, Pattern, SENTINEL};
use crate::walker::redact_json_bytes;

/// Built from a DLP config's enabled flag and regex pattern list (built-ins
/// plus user-supplied, spec.md §4.2). Construct once and share; it holds no
/// per-request state.
pub struct Redactor {
    builtins: Vec<Pattern>,
    custom: Vec<Pattern>,
}

impl Redactor {
    pub fn new(custom_patterns: &[String]) -> Self {
        Self { builtins: builtin_patterns(), custom: compile_custom_patterns(custom_patterns) }
    }

    pub fn has_custom_patterns(&self) -> bool {
        !self.custom.is_empty()
    }

    /// Runs every applicable pattern over `s`, replacing each match with
    /// [`SENTINEL`]. Built-in patterns only run if their cheap pre-check
    /// passes; custom patterns always run.
    pub fn redact_string(&self, s: &str) -> String {
        let mut out = s.to_string();
        for pattern in &self.builtins {
            if pattern.requires.applies(&out) {
                out = pattern.regex.replace_all(&out, SENTINEL).into_owned();
            }
        }
        for pattern in &self.custom {
            out = pattern.regex.replace_all(&out, SENTINEL).into_owned();
        }
        out
    }

    /// Walks the JSON stream without a full unmarshal, redacting every
    /// string literal encountered (spec.md §4.2).
    pub fn redact_json(&self, bytes: &[u8]) -> Vec<u8> {
        redact_json_bytes(bytes, self)
    }

    /// Walks an already-parsed map, redacting string values recursively.
    /// Object keys are never redacted.
    pub fn redact_map(&self, map: &serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
        map.iter().map(|(k, v)| (k.clone(), self.redact_value(v))).collect()
    }

    pub fn redact_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.redact_string(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_value(v)).collect()),
            Value::Object(map) => Value::Object(self.redact_map(map)),
            other => other.clone(),
        }
    }
}
