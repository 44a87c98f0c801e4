use toolgate_core::pipeline::{BoxFuture, MethodMiddleware, MethodNext};
use toolgate_core::request::ToolGateRequest;
use toolgate_core::{RequestContext, ToolGateError};

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct GuardrailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub blocked_phrases: Vec<String>,
}

/// Scans POST-shaped request bodies — tool-call arguments and prompt-get
/// arguments — for configured blocked phrases, case-insensitive substring
/// match (spec.md §4.10). Other request shapes carry no free-text body and
/// pass through untouched.
pub struct GuardrailMiddleware {
    config: GuardrailConfig,
}

impl GuardrailMiddleware {
    pub fn new(config: GuardrailConfig) -> Self {
        Self { config }
    }
}

fn find_blocked_phrase<'a>(haystack: &str, blocked: &'a [String]) -> Option<&'a str> {
    let haystack_lower = haystack.to_lowercase();
    blocked.iter().map(String::as_str).find(|phrase| haystack_lower.contains(&phrase.to_lowercase()))
}

impl MethodMiddleware for GuardrailMiddleware {
    fn handle<'a>(
        &'a self,
        ctx: RequestContext,
        req: ToolGateRequest,
        next: MethodNext<'a>,
    ) -> BoxFuture<'a, Result<toolgate_core::request::ToolGateResult, ToolGateError>> {
        Box::pin(async move {
            if !self.config.enabled {
                return next.run(ctx, req).await;
            }

            let blocked = match &req {
                ToolGateRequest::ToolCall { arguments, .. } => {
                    let text = String::from_utf8_lossy(arguments);
                    find_blocked_phrase(&text, &self.config.blocked_phrases).map(str::to_string)
                }
                ToolGateRequest::PromptGet { arguments, .. } => {
                    arguments.values().find_map(|v| find_blocked_phrase(v, &self.config.blocked_phrases).map(str::to_string))
                }
                _ => None,
            };

            if let Some(phrase) = blocked {
                return Err(ToolGateError::PolicyDenied(format!("request body contains blocked phrase \"{phrase}\"")));
            }

            next.run(ctx, req).await
        })
    }

    fn name(&self) -> &'static str {
        "guardrail"
    }
}
