use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

fn default_timeout_secs() -> u64 {
    10
}

/// Typed configuration materialized from the embedding provider's
/// `serde_json::Value` blob (spec.md §1 ambient config conventions).
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
    pub provider: String,
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Only consulted by the templated/generic provider: a request body
    /// template with `{{text}}` substituted in, and a `/`-separated JSON
    /// pointer to the float array in the response.
    #[serde(default)]
    pub request_template: Option<Value>,
    #[serde(default)]
    pub response_vector_pointer: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}
