use std::time::Duration;

use serde::{Deserialize, Serialize};
use toolgate_core::ToolGateError;

use crate::config::EmbeddingProviderConfig;
use crate::{default_http_client, extract_error_body, EmbeddingProvider};

/// `POST {base_url}/api/embeddings` with `{"model", "prompt"}`, Ollama's
/// native wire shape.
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: Option<usize>,
}

#[derive(Serialize)]
struct OllamaEmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbeddingProvider {
    pub fn from_config(cfg: &EmbeddingProviderConfig) -> Result<Self, ToolGateError> {
        let client = default_http_client(Duration::from_secs(cfg.timeout_secs))?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone().unwrap_or_else(|| "nomic-embed-text".to_string()),
            dimension: cfg.dimension,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolGateError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&OllamaEmbeddingsRequest { model: &self.model, prompt: text })
            .send()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("embedding request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(extract_error_body(status, &body));
        }

        let parsed: OllamaEmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("embedding response: {e}")))?;

        Ok(parsed.embedding)
    }

    fn dimension_hint(&self) -> Option<usize> {
        self.dimension
    }
}
