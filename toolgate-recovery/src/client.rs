use toolgate_core::ToolGateError;

/// Narrow interface to the LLM used for argument repair (spec.md §1 "the LLM
/// client used by smart-recovery" is an external collaborator — this is the
/// seam). Implementations own model choice, HTTP transport, and API key
/// handling; this middleware only ever sends a prompt and reads back text.
#[async_trait::async_trait]
pub trait RecoveryLlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ToolGateError>;
}

/// Constructs a client given a resolved API key. Supplied by the embedder;
/// invoked at most once per middleware instance (guarded by the mutex +
/// double-check in [`crate::middleware::RecoveryMiddleware`]).
pub trait RecoveryLlmClientFactory: Send + Sync {
    fn build(&self, api_key: &str) -> Result<std::sync::Arc<dyn RecoveryLlmClient>, ToolGateError>;
}
