use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};

use crate::client::{RecoveryLlmClient, RecoveryLlmClientFactory};
use crate::repair::{build_prompt, parse_repaired_arguments};

/// `api_key` arrives already resolved by the surrounding server's secret
/// store (spec.md §1 scopes credential resolution out of this crate); it is
/// still a plain field here so the rest of the config can deserialize from
/// the same blob every other middleware does.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RecoveryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub api_key: String,
}

/// Retries a failed tool call with LLM-repaired arguments, up to
/// `max_retries` times (spec.md §4.7). Only [`ToolGateError::RecoverableUpstream`]
/// triggers a retry; any other error (including a second recovery attempt's
/// failure) is returned unchanged, and on exhaustion the *original* error is
/// what callers see, never a recovery-specific one.
pub struct RecoveryMiddleware {
    config: RecoveryConfig,
    factory: Box<dyn RecoveryLlmClientFactory>,
    client: RwLock<Option<Arc<dyn RecoveryLlmClient>>>,
    init_lock: Mutex<()>,
}

impl RecoveryMiddleware {
    pub fn new(config: RecoveryConfig, factory: Box<dyn RecoveryLlmClientFactory>) -> Self {
        Self { config, factory, client: RwLock::new(None), init_lock: Mutex::new(()) }
    }

    async fn client(&self) -> Result<Arc<dyn RecoveryLlmClient>, ToolGateError> {
        if let Some(client) = self.client.read().await.clone() {
            return Ok(client);
        }

        let _guard = self.init_lock.lock().await;
        if let Some(client) = self.client.read().await.clone() {
            return Ok(client);
        }

        let client = self.factory.build(&self.config.api_key)?;
        *self.client.write().await = Some(client.clone());
        Ok(client)
    }
}

impl ExecutionMiddleware for RecoveryMiddleware {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        mut req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        Box::pin(async move {
            if !self.config.enabled {
                return next.run(ctx, req).await;
            }

            let mut attempt = 0u32;
            let mut first_error: Option<String> = None;
            loop {
                let outcome = next.run(ctx.clone(), req.clone()).await;

                let current_error = match &outcome {
                    Err(ToolGateError::RecoverableUpstream(msg)) => msg.clone(),
                    _ => return outcome,
                };
                let first_error = first_error.get_or_insert_with(|| current_error.clone());

                if attempt >= self.config.max_retries || ctx.is_cancelled() {
                    return Err(ToolGateError::RecoverableUpstream(first_error.clone()));
                }

                let client = match self.client().await {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(error = %e, "recovery llm client unavailable, giving up");
                        return outcome;
                    }
                };

                let arguments = req.arguments().cloned().unwrap_or(serde_json::json!({}));
                let prompt = build_prompt(&req.tool_name, &arguments, &current_error);

                let reply = match client.complete(&prompt).await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "recovery llm call failed, returning original error");
                        return outcome;
                    }
                };

                let Some(repaired) = parse_repaired_arguments(&reply) else {
                    tracing::warn!("recovery llm reply was not a valid JSON object, returning original error");
                    return outcome;
                };

                req.set_arguments(repaired);
                attempt += 1;
            }
        })
    }

    fn name(&self) -> &'static str {
        "recovery"
    }
}

