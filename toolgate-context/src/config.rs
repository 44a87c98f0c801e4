/// Per-service (no tool/service layering — the original spec names a single
/// `max_chars` budget, not a per-tool override table; see DESIGN.md).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    8_000
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { enabled: false, max_chars: default_max_chars() }
    }
}
