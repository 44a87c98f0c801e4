use serde_json::Value;

/// Builds the repair prompt sent to the LLM client (spec.md §4.7): names the
/// tool, shows its current arguments, and states the error that occurred.
pub fn build_prompt(tool_name: &str, arguments: &Value, error_message: &str) -> String {
    format!(
        "The tool \"{tool_name}\" failed with the following error:\n{error_message}\n\n\
         Its current arguments were:\n{arguments}\n\n\
         Reply with a corrected JSON object of arguments for this tool, and nothing else."
    )
}

/// Strips a leading/trailing markdown code fence (``` or ```json) if present,
/// then parses the remainder as a JSON object. Anything that doesn't parse
/// to a JSON object (including valid JSON of another shape) is rejected —
/// the caller falls back to the original error.
pub fn parse_repaired_arguments(reply: &str) -> Option<Value> {
    let stripped = strip_code_fence(reply.trim());
    let value: Value = serde_json::from_str(stripped.trim()).ok()?;
    if value.is_object() {
        Some(value)
    } else {
        None
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_object() {
        let parsed = parse_repaired_arguments(r#"{"a": 1}"#).unwrap();
        assert_eq!(parsed, serde_json::json!({"a": 1}));
    }

    #[test]
    fn strips_fenced_json_block() {
        let reply = "```json\n{\"a\": 1}\n```";
        let parsed = parse_repaired_arguments(reply).unwrap();
        assert_eq!(parsed, serde_json::json!({"a": 1}));
    }

    #[test]
    fn strips_fence_without_language_tag() {
        let reply = "```\n{\"a\": 1}\n```";
        let parsed = parse_repaired_arguments(reply).unwrap();
        assert_eq!(parsed, serde_json::json!({"a": 1}));
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(parse_repaired_arguments("[1, 2, 3]").is_none());
        assert!(parse_repaired_arguments("42").is_none());
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_repaired_arguments("not json at all").is_none());
    }
}
