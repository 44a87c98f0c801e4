//! Token and byte size estimation (spec.md C2), used by rate-limit cost
//! computation (§4.5) and metrics middleware (§4.9).
//!
//! No real BPE vocabulary is shipped — that would make this crate's output
//! provider-specific and is out of scope (spec.md §1 lists the LLM client as
//! an external collaborator). Instead a character-ratio estimator is used,
//! same approximation used elsewhere for this purpose: ~4 bytes per token.

use serde_json::Value;

/// Estimates token counts for arbitrary text. Implement this to plug in a
/// real vocabulary-aware tokenizer; [`CharRatioEstimator`] is the default.
pub trait TokenEstimator: Send + Sync {
    fn estimate_tokens(&self, text: &str) -> usize;
}

/// Divides UTF-8 byte length by a fixed ratio, rounding up. Returns a minimum
/// of 1 for non-empty text and 0 for empty text.
#[derive(Debug, Clone, Copy)]
pub struct CharRatioEstimator {
    bytes_per_token: usize,
}

impl CharRatioEstimator {
    pub fn new(bytes_per_token: usize) -> Self {
        Self { bytes_per_token: bytes_per_token.max(1) }
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let tokens = (text.len() + self.bytes_per_token - 1) / self.bytes_per_token;
        tokens.max(1)
    }
}

/// Walk an arbitrary JSON argument structure and sum token costs: strings are
/// counted via `estimator`; non-string scalars are converted via their
/// `Display`/JSON string form and counted the same way; objects and arrays
/// recurse into their members. Minimum total cost is 1 (spec.md §4.5).
pub fn estimate_value_tokens(value: &Value, estimator: &dyn TokenEstimator) -> usize {
    let total = match value {
        Value::Null => 0,
        Value::Bool(b) => estimator.estimate_tokens(if *b { "true" } else { "false" }),
        Value::Number(n) => estimator.estimate_tokens(&n.to_string()),
        Value::String(s) => estimator.estimate_tokens(s),
        Value::Array(items) => items.iter().map(|v| estimate_value_tokens(v, estimator)).sum(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| estimator.estimate_tokens(k) + estimate_value_tokens(v, estimator))
            .sum(),
    };
    total.max(1)
}

/// The serialized byte size of a JSON value (used for request/response byte
/// metrics, spec.md §4.9).
pub fn byte_size(value: &Value) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_costs_zero_tokens() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.estimate_tokens(""), 0);
    }

    #[test]
    fn short_string_costs_at_least_one_token() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.estimate_tokens("hi"), 1);
    }

    #[test]
    fn longer_string_scales_with_length() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.estimate_tokens(&"a".repeat(16)), 4);
    }

    #[test]
    fn value_tokens_walks_nested_structures() {
        let est = CharRatioEstimator::default();
        let v = serde_json::json!({"a": "hello world", "b": [1, 2, "three"]});
        let tokens = estimate_value_tokens(&v, &est);
        assert!(tokens >= 1);
    }

    #[test]
    fn value_tokens_has_minimum_of_one() {
        let est = CharRatioEstimator::default();
        assert_eq!(estimate_value_tokens(&Value::Null, &est), 1);
    }
}
