use regex::Regex;

pub const SENTINEL: &str = "***REDACTED***";

/// One compiled pattern plus the cheap pre-check that lets `redact_string`
/// skip running it entirely (spec.md §4.2 fast path).
pub struct Pattern {
    pub name: &'static str,
    pub regex: Regex,
    pub requires: PreCheck,
}

#[derive(Debug, Clone, Copy)]
pub enum PreCheck {
    Contains(char),
    ContainsAsciiDigit,
    Always,
}

impl PreCheck {
    pub fn applies(&self, s: &str) -> bool {
        match self {
            PreCheck::Contains(c) => s.contains(*c),
            PreCheck::ContainsAsciiDigit => s.bytes().any(|b| b.is_ascii_digit()),
            PreCheck::Always => true,
        }
    }
}

pub fn builtin_patterns() -> Vec<Pattern> {
    vec![
        Pattern {
            name: "email",
            regex: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            requires: PreCheck::Contains('@'),
        },
        Pattern {
            name: "credit_card",
            regex: Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap(),
            requires: PreCheck::ContainsAsciiDigit,
        },
        Pattern {
            name: "ssn",
            regex: Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap(),
            requires: PreCheck::ContainsAsciiDigit,
        },
    ]
}

/// Compiles user-supplied patterns, logging and skipping any that fail to
/// parse as a regex (spec.md §4.2) rather than failing construction.
pub fn compile_custom_patterns(raw: &[String]) -> Vec<Pattern> {
    raw.iter()
        .filter_map(|source| match Regex::new(source) {
            Ok(regex) => Some(Pattern { name: "custom", regex, requires: PreCheck::Always }),
            Err(e) => {
                tracing::warn!(pattern = %source, error = %e, "invalid DLP pattern, skipping");
                None
            }
        })
        .collect()
}
