pub const SENTINEL: &str = "...[TRUNCATED]";

/// Truncates `s` to at most `max_chars` bytes, rounding down to the nearest
/// complete UTF-8 codepoint boundary, and appends [`SENTINEL`]. Returns
/// `None` if `s` is already within budget (spec.md §4.8, §8 UTF-8 safety
/// property): a naive `&s[..max_chars]` slice can land inside a multi-byte
/// codepoint and panic, so the boundary is walked back byte by byte.
pub fn truncate_utf8_safe(s: &str, max_chars: usize) -> Option<String> {
    if s.len() <= max_chars {
        return None;
    }
    let mut end = max_chars;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + SENTINEL.len());
    out.push_str(&s[..end]);
    out.push_str(SENTINEL);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_short_text_untouched() {
        assert_eq!(truncate_utf8_safe("hello", 10), None);
    }

    #[test]
    fn truncates_at_exact_boundary_for_ascii() {
        let out = truncate_utf8_safe("abcdefghij", 4).unwrap();
        assert_eq!(out, format!("abcd{SENTINEL}"));
    }

    #[test]
    fn never_splits_a_multibyte_codepoint() {
        // "café" - 'é' is 2 bytes (U+00E9), landing max_chars=4 would split it.
        let out = truncate_utf8_safe("café repeated many times over", 4).unwrap();
        assert!(out.is_char_boundary(out.len() - SENTINEL.len()));
        assert!(out.starts_with("caf"));
        assert!(!out.contains('\u{FFFD}'));
    }

    #[test]
    fn handles_emoji_correctly() {
        // Each crab emoji is 4 bytes; max_chars=2 falls inside the first one,
        // so the boundary walks back to 0 and only the sentinel survives.
        let s = "\u{1F980}\u{1F980}\u{1F980} lots more text after that to exceed budget";
        let out = truncate_utf8_safe(s, 2).unwrap();
        assert!(!out.contains('\u{FFFD}'));
        assert_eq!(out, SENTINEL);

        // max_chars=4 lands exactly on the boundary after the first emoji.
        let out = truncate_utf8_safe(s, 4).unwrap();
        assert_eq!(out, format!("\u{1F980}{SENTINEL}"));
    }
}
