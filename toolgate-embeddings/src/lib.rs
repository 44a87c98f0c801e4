//! Embedding providers for semantic caching (spec.md C3).
//!
//! Three concrete providers plus a config-driven factory: OpenAI-style
//! (`POST {base_url}/embeddings`), Ollama-style (`POST {base_url}/api/embeddings`),
//! and a generic templated-HTTP provider for anything else that accepts a
//! JSON body and returns a float array somewhere in its response.

use std::time::Duration;

use serde_json::Value;
use toolgate_core::ToolGateError;

mod config;
mod ollama;
mod openai;
mod templated;

pub use config::EmbeddingProviderConfig;
pub use ollama::OllamaEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;
pub use templated::TemplatedHttpEmbeddingProvider;

/// Maps text to a float vector. Implementations are expected to be cheap to
/// clone (wrap an `Arc`-shared `reqwest::Client`) since the cache engine
/// creates one provider per service and shares it across calls.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolGateError>;

    /// Declared vector dimension, if known ahead of the first call. The cache
    /// middleware checks a freshly computed embedding against this before
    /// ever handing it to the vector store, so a misconfigured provider fails
    /// with a provider-specific message instead of the store's generic
    /// cross-scope mismatch error. The store's own per-scope check (fixed by
    /// whatever length its first insert used) is the authoritative guard
    /// either way.
    fn dimension_hint(&self) -> Option<usize> {
        None
    }
}

pub(crate) fn default_http_client(timeout: Duration) -> Result<reqwest::Client, ToolGateError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ToolGateError::ConfigInvalid(format!("embedding http client: {e}")))
}

pub(crate) fn extract_error_body(status: reqwest::StatusCode, body: &str) -> ToolGateError {
    ToolGateError::BackendUnavailable(format!("embedding provider returned {status}: {body}"))
}

/// Builds the configured embedding provider from a middleware config blob
/// (spec.md §4.3): `{"provider": "openai" | "ollama" | "http" | <legacy tag>, ...}`.
/// Unknown providers are a `ConfigInvalid` error; the cache engine interprets
/// that as fail-open for caching (logs and forwards to `next`).
pub fn build_provider(config: &Value) -> Result<std::sync::Arc<dyn EmbeddingProvider>, ToolGateError> {
    let cfg: EmbeddingProviderConfig = serde_json::from_value(config.clone())
        .map_err(|e| ToolGateError::ConfigInvalid(format!("embedding provider config: {e}")))?;

    match cfg.provider.as_str() {
        "openai" | "openai-style" => {
            Ok(std::sync::Arc::new(OpenAiEmbeddingProvider::from_config(&cfg)?))
        }
        "ollama" | "ollama-style" => {
            Ok(std::sync::Arc::new(OllamaEmbeddingProvider::from_config(&cfg)?))
        }
        "http" | "templated" | "generic" => {
            Ok(std::sync::Arc::new(TemplatedHttpEmbeddingProvider::from_config(&cfg)?))
        }
        other => Err(ToolGateError::ConfigInvalid(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}
