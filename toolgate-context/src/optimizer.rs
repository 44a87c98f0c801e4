use serde_json::Value;

use crate::truncate::truncate_utf8_safe;

/// Walks `result.content[*].text` (spec.md §4.8) and truncates any text over
/// `max_chars`. Shapes that don't match — no `content` array, non-object
/// items, non-string `text` — pass through unchanged field by field.
pub fn optimize_result(result: &Value, max_chars: usize) -> Value {
    let mut result = result.clone();
    if let Some(content) = result.get_mut("content").and_then(Value::as_array_mut) {
        for item in content.iter_mut() {
            let Some(text) = item.get("text").and_then(Value::as_str) else { continue };
            if let Some(truncated) = truncate_utf8_safe(text, max_chars) {
                item["text"] = Value::String(truncated);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truncate::SENTINEL;

    #[test]
    fn truncates_oversized_text_entries() {
        let result = serde_json::json!({"content": [{"type": "text", "text": "abcdefghij"}]});
        let out = optimize_result(&result, 4);
        assert_eq!(out, serde_json::json!({"content": [{"type": "text", "text": format!("abcd{SENTINEL}")}]}));
    }

    #[test]
    fn leaves_short_text_untouched() {
        let result = serde_json::json!({"content": [{"type": "text", "text": "short"}]});
        let out = optimize_result(&result, 100);
        assert_eq!(out, result);
    }

    #[test]
    fn non_text_content_parts_pass_through() {
        let result = serde_json::json!({"content": [{"type": "image", "data": "xx"}]});
        let out = optimize_result(&result, 1);
        assert_eq!(out, result);
    }

    #[test]
    fn shapes_without_a_content_array_pass_through_unchanged() {
        let result = serde_json::json!({"tools": [{"name": "x"}]});
        let out = optimize_result(&result, 1);
        assert_eq!(out, result);
    }

    #[test]
    fn multiple_content_entries_are_each_evaluated_independently() {
        let result =
            serde_json::json!({"content": [{"type": "text", "text": "short"}, {"type": "text", "text": "abcdefghij"}]});
        let out = optimize_result(&result, 4);
        assert_eq!(
            out,
            serde_json::json!({"content": [{"type": "text", "text": "short"}, {"type": "text", "text": format!("abcd{SENTINEL}")}]})
        );
    }
}
