use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

fn default_ttl_secs() -> u64 {
    300
}

fn default_threshold() -> f32 {
    0.95
}

fn default_memory_capacity() -> usize {
    10_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    Exact,
    Semantic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheBackend {
    Memory,
    Redis { url: String },
}

impl Default for CacheBackend {
    fn default() -> Self {
        CacheBackend::Memory
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorBackend {
    Memory {
        #[serde(default = "default_memory_capacity")]
        capacity: usize,
    },
    Sqlite {
        path: String,
    },
}

impl Default for VectorBackend {
    fn default() -> Self {
        VectorBackend::Memory { capacity: default_memory_capacity() }
    }
}

/// One resolved cache configuration (spec.md §4.3). Constructed from a
/// middleware configuration blob, or from a layer in [`CacheConfigLayers`].
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    pub strategy: CacheStrategy,
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    /// Only consulted when `strategy == Semantic`: the embedding provider
    /// config blob, passed through to `toolgate_embeddings::build_provider`.
    #[serde(default)]
    pub embedding: Option<Value>,
    #[serde(default)]
    pub vector_backend: VectorBackend,
}

/// Resolves the effective cache config by walking tool → service → default
/// (spec.md §4.3 step 1).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfigLayers {
    #[serde(default)]
    pub tool: HashMap<String, CacheConfig>,
    #[serde(default)]
    pub service: HashMap<String, CacheConfig>,
    #[serde(default)]
    pub default: Option<CacheConfig>,
}

impl CacheConfigLayers {
    pub fn resolve(&self, tool_name: &str, service_id: &str) -> Option<&CacheConfig> {
        self.tool
            .get(tool_name)
            .or_else(|| self.service.get(service_id))
            .or(self.default.as_ref())
    }
}
