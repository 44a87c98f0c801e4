use crate::redactor::Redactor;

/// States of the hand-written JSON scanner (spec.md §9). Only `String` and
/// `StringEscape` ever look closely at bytes; every other state exists so
/// the walker always knows, at the current byte, whether a quote starts a
/// new string literal or a `/` is just ordinary data inside one — JSON has
/// no comments, so the walker never special-cases `/` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Expect the start of a value: string, number, literal, `{`, or `[`.
    Value,
    /// Inside an object, expect a key string or `}` (empty object).
    ObjectKey,
    /// A key string just closed; expect `:`.
    ObjectColon,
    /// A value inside an object just closed; expect `,` or `}`.
    ValueInObject,
    /// A value inside an array just closed; expect `,` or `]`.
    ValueInArray,
    String,
    StringEscape,
    Number,
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// What state to resume in after a value (string/number/literal/nested
/// container) finishes, based on what it's nested inside.
fn after_value(stack: &[Container]) -> State {
    match stack.last() {
        Some(Container::Object) => State::ValueInObject,
        Some(Container::Array) => State::ValueInArray,
        None => State::Value,
    }
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Redacts every JSON string literal in `bytes` — keys and values alike — by
/// scanning once, without a full unmarshal/remarshal cycle (spec.md §4.2).
/// Non-string bytes (numbers, punctuation, `true`/`false`/`null`) are copied
/// through unchanged.
pub fn redact_json_bytes(bytes: &[u8], redactor: &Redactor) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Value;
    let mut stack: Vec<Container> = Vec::new();
    let mut string_start = 0usize;
    let mut string_is_key = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Value => match b {
                _ if is_json_whitespace(b) => out.push(b),
                b'"' => {
                    string_start = i;
                    string_is_key = false;
                    state = State::String;
                }
                b'-' | b'0'..=b'9' => {
                    out.push(b);
                    state = State::Number;
                }
                b't' | b'f' | b'n' => {
                    out.push(b);
                    state = State::Literal;
                }
                b'{' => {
                    out.push(b);
                    stack.push(Container::Object);
                    state = State::ObjectKey;
                }
                b'[' => {
                    out.push(b);
                    stack.push(Container::Array);
                    state = State::Value;
                }
                b']' | b'}' => {
                    // Closes an empty array/object opened one level up.
                    out.push(b);
                    stack.pop();
                    state = after_value(&stack);
                }
                _ => out.push(b),
            },
            State::ObjectKey => match b {
                _ if is_json_whitespace(b) => out.push(b),
                b'"' => {
                    string_start = i;
                    string_is_key = true;
                    state = State::String;
                }
                b'}' => {
                    out.push(b);
                    stack.pop();
                    state = after_value(&stack);
                }
                _ => out.push(b),
            },
            State::ObjectColon => match b {
                _ if is_json_whitespace(b) => out.push(b),
                b':' => {
                    out.push(b);
                    state = State::Value;
                }
                _ => out.push(b),
            },
            State::ValueInObject => match b {
                _ if is_json_whitespace(b) => out.push(b),
                b',' => {
                    out.push(b);
                    state = State::ObjectKey;
                }
                b'}' => {
                    out.push(b);
                    stack.pop();
                    state = after_value(&stack);
                }
                _ => out.push(b),
            },
            State::ValueInArray => match b {
                _ if is_json_whitespace(b) => out.push(b),
                b',' => {
                    out.push(b);
                    state = State::Value;
                }
                b']' => {
                    out.push(b);
                    stack.pop();
                    state = after_value(&stack);
                }
                _ => out.push(b),
            },
            State::String => match b {
                b'\\' => state = State::StringEscape,
                b'"' => {
                    let literal = &bytes[string_start..=i];
                    out.extend_from_slice(&redact_string_literal(literal, redactor));
                    state = if string_is_key { State::ObjectColon } else { after_value(&stack) };
                }
                _ => {}
            },
            State::StringEscape => {
                state = State::String;
            }
            State::Number => match b {
                b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-' => out.push(b),
                _ => {
                    state = after_value(&stack);
                    continue;
                }
            },
            State::Literal => match b {
                b'a'..=b'z' => out.push(b),
                _ => {
                    state = after_value(&stack);
                    continue;
                }
            },
        }
        i += 1;
    }

    out
}

/// `literal` is a complete JSON string token including its surrounding
/// quotes. Fast path (spec.md §4.2): if there are no custom patterns and the
/// literal contains no `@`, digit, or backslash escape, it cannot match any
/// built-in or custom pattern, so it is returned unchanged. Otherwise the
/// literal is unescaped via `serde_json`, redacted as text, and
/// re-serialized (which re-applies correct JSON escaping, including
/// `\uXXXX` sequences).
fn redact_string_literal(literal: &[u8], redactor: &Redactor) -> Vec<u8> {
    let inner = &literal[1..literal.len() - 1];
    let needs_scan = redactor.has_custom_patterns()
        || inner.iter().any(|&b| b == b'@' || b == b'\\' || b.is_ascii_digit());
    if !needs_scan {
        return literal.to_vec();
    }

    match serde_json::from_slice::<String>(literal) {
        Ok(decoded) => {
            let redacted = redactor.redact_string(&decoded);
            serde_json::to_vec(&redacted).unwrap_or_else(|_| literal.to_vec())
        }
        Err(_) => literal.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redact(json: &str, redactor: &Redactor) -> String {
        String::from_utf8(redact_json_bytes(json.as_bytes(), redactor)).unwrap()
    }

    #[test]
    fn redacts_string_value_leaving_structure_intact() {
        let redactor = Redactor::new(&[]);
        let out = redact(r#"{"email":"a@example.com","n":1}"#, &redactor);
        assert_eq!(out, r#"{"email":"***REDACTED***","n":1}"#);
    }

    #[test]
    fn leaves_numbers_and_booleans_untouched() {
        let redactor = Redactor::new(&[]);
        let out = redact(r#"{"a":1,"b":true,"c":null,"d":-3.5e2}"#, &redactor);
        assert_eq!(out, r#"{"a":1,"b":true,"c":null,"d":-3.5e2}"#);
    }

    #[test]
    fn handles_escaped_quotes_inside_strings() {
        let redactor = Redactor::new(&[]);
        let out = redact(r#"{"s":"he said \"hi a@example.com\""}"#, &redactor);
        assert_eq!(out, r#"{"s":"he said \"hi ***REDACTED***\""}"#);
    }

    #[test]
    fn handles_unicode_content() {
        let redactor = Redactor::new(&[]);
        let out = redact(r#"{"s":"café a@example.com"}"#, &redactor);
        assert!(out.contains("***REDACTED***"));
        assert!(!out.contains("a@example.com"));
    }

    #[test]
    fn slash_inside_string_is_not_mistaken_for_a_comment() {
        let redactor = Redactor::new(&[]);
        let out = redact(r#"{"s":"10 / 2 equals 5"}"#, &redactor);
        assert_eq!(out, r#"{"s":"10 / 2 equals 5"}"#);
    }

    #[test]
    fn nested_arrays_and_objects_are_walked() {
        let redactor = Redactor::new(&[]);
        let out = redact(r#"{"list":["a@example.com",{"k":"b@example.com"}]}"#, &redactor);
        assert_eq!(out, r#"{"list":["***REDACTED***",{"k":"***REDACTED***"}]}"#);
    }

    #[test]
    fn empty_object_and_array_round_trip() {
        let redactor = Redactor::new(&[]);
        assert_eq!(redact("{}", &redactor), "{}");
        assert_eq!(redact("[]", &redactor), "[]");
        assert_eq!(redact(r#"{"a":[],"b":{}}"#, &redactor), r#"{"a":[],"b":{}}"#);
    }

    #[test]
    fn array_of_scalars_after_comma_resumes_value_state() {
        let redactor = Redactor::new(&[]);
        let out = redact(r#"["a@example.com", 1, "b@example.com", true]"#, &redactor);
        assert_eq!(out, r#"["***REDACTED***", 1, "***REDACTED***", true]"#);
    }

    #[test]
    fn object_keys_are_also_redacted_by_the_byte_walker() {
        // Unlike redact_map/redact_value, the byte-level walker has no cheap
        // way to distinguish "this string is a key" from "this string is a
        // value" without extra bookkeeping it doesn't need for correctness,
        // so it treats every string literal uniformly.
        let redactor = Redactor::new(&[]);
        let out = redact(r#"{"a@example.com":"123-45-6789"}"#, &redactor);
        assert!(!out.contains("a@example.com"));
        assert!(!out.contains("123-45-6789"));
    }
}
