use std::time::Duration;

use serde::{Deserialize, Serialize};
use toolgate_core::ToolGateError;

use crate::config::EmbeddingProviderConfig;
use crate::{default_http_client, extract_error_body, EmbeddingProvider};

/// `POST {base_url}/embeddings` with `{"model", "input"}`, OpenAI's
/// `/v1/embeddings` wire shape. Any OpenAI-compatible endpoint works
/// (the base URL is fully configurable, not hardcoded).
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: Option<usize>,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingsDatum>,
}

#[derive(Deserialize)]
struct EmbeddingsDatum {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingProvider {
    pub fn from_config(cfg: &EmbeddingProviderConfig) -> Result<Self, ToolGateError> {
        let client = default_http_client(Duration::from_secs(cfg.timeout_secs))?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone().unwrap_or_else(|| "text-embedding-3-small".to_string()),
            api_key: cfg.api_key.clone(),
            dimension: cfg.dimension,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolGateError> {
        let mut req = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&EmbeddingsRequest { model: &self.model, input: text });

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("embedding request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(extract_error_body(status, &body));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ToolGateError::BackendUnavailable("embedding response had no data".into()))
    }

    fn dimension_hint(&self) -> Option<usize> {
        self.dimension
    }
}
