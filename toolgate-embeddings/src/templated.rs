use std::time::Duration;

use serde_json::Value;
use toolgate_core::ToolGateError;

use crate::config::EmbeddingProviderConfig;
use crate::{default_http_client, extract_error_body, EmbeddingProvider};

/// A catch-all provider for anything that isn't OpenAI- or Ollama-shaped:
/// the request body is a JSON template with every string value containing
/// the literal `{{text}}` replaced by the input text, and the response
/// vector is read out via a `/`-separated JSON pointer.
pub struct TemplatedHttpEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    headers: Vec<(String, String)>,
    request_template: Value,
    response_vector_pointer: String,
    dimension: Option<usize>,
}

impl TemplatedHttpEmbeddingProvider {
    pub fn from_config(cfg: &EmbeddingProviderConfig) -> Result<Self, ToolGateError> {
        let client = default_http_client(Duration::from_secs(cfg.timeout_secs))?;
        let request_template = cfg.request_template.clone().ok_or_else(|| {
            ToolGateError::ConfigInvalid("http embedding provider requires request_template".into())
        })?;
        let response_vector_pointer = cfg.response_vector_pointer.clone().ok_or_else(|| {
            ToolGateError::ConfigInvalid(
                "http embedding provider requires response_vector_pointer".into(),
            )
        })?;
        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
            headers: cfg.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            request_template,
            response_vector_pointer,
            dimension: cfg.dimension,
        })
    }
}

fn substitute_text(template: &Value, text: &str) -> Value {
    match template {
        Value::String(s) => Value::String(s.replace("{{text}}", text)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_text(v, text)).collect()),
        Value::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), substitute_text(v, text))).collect(),
        ),
        other => other.clone(),
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TemplatedHttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolGateError> {
        let body = substitute_text(&self.request_template, text);

        let mut req = self.client.post(&self.base_url).json(&body);
        for (name, value) in &self.headers {
            req = req.header(name, value);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("embedding request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(extract_error_body(status, &raw));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("embedding response: {e}")))?;

        let pointer_path = if self.response_vector_pointer.starts_with('/') {
            self.response_vector_pointer.clone()
        } else {
            format!("/{}", self.response_vector_pointer)
        };
        let pointer = parsed.pointer(&pointer_path).ok_or_else(|| {
            ToolGateError::BackendUnavailable(format!(
                "embedding response missing pointer '{pointer_path}'"
            ))
        })?;

        let vector: Vec<f32> = serde_json::from_value(pointer.clone()).map_err(|e| {
            ToolGateError::BackendUnavailable(format!("embedding response vector: {e}"))
        })?;

        Ok(vector)
    }

    fn dimension_hint(&self) -> Option<usize> {
        self.dimension
    }
}
