use bytes::Bytes;
use toolgate_core::pipeline::{BoxFuture, MethodMiddleware, MethodNext};
use toolgate_core::request::{ContentPart, ToolGateRequest, ToolGateResult};
use toolgate_core::{RequestContext, ToolGateError};

use crate::config::DlpConfig;
use crate::redactor::Redactor;

/// Wires the [`Redactor`] into the request/response surfaces the method
/// chain knows about (spec.md §4.2): tool-call arguments and prompt-get
/// arguments going in; tool-result text, prompt messages, and resource
/// contents coming back out. Non-string content (images, blobs) passes
/// through untouched.
pub struct DlpMiddleware {
    config: DlpConfig,
    redactor: Redactor,
}

impl DlpMiddleware {
    pub fn new(config: DlpConfig) -> Self {
        let redactor = Redactor::new(&config.patterns);
        Self { config, redactor }
    }

    fn redact_request(&self, req: ToolGateRequest) -> ToolGateRequest {
        match req {
            ToolGateRequest::ToolCall { tool_name, arguments } => {
                let redacted = self.redactor.redact_json(&arguments);
                ToolGateRequest::ToolCall { tool_name, arguments: Bytes::from(redacted) }
            }
            ToolGateRequest::PromptGet { name, arguments } => {
                let redacted =
                    arguments.into_iter().map(|(k, v)| (k, self.redactor.redact_string(&v))).collect();
                ToolGateRequest::PromptGet { name, arguments: redacted }
            }
            other => other,
        }
    }

    fn redact_content(&self, part: ContentPart) -> ContentPart {
        match part {
            ContentPart::Text { text } => ContentPart::Text { text: self.redactor.redact_string(&text) },
            other => other,
        }
    }

    fn redact_result(&self, result: ToolGateResult) -> ToolGateResult {
        match result {
            ToolGateResult::ToolResult { content } => {
                ToolGateResult::ToolResult { content: content.into_iter().map(|p| self.redact_content(p)).collect() }
            }
            ToolGateResult::PromptMessages { messages } => ToolGateResult::PromptMessages {
                messages: messages
                    .into_iter()
                    .map(|mut m| {
                        m.content = self.redact_content(m.content);
                        m
                    })
                    .collect(),
            },
            ToolGateResult::ResourceContents { contents } => ToolGateResult::ResourceContents {
                contents: contents
                    .into_iter()
                    .map(|mut r| {
                        r.content = self.redact_content(r.content);
                        r
                    })
                    .collect(),
            },
            other => other,
        }
    }
}

impl MethodMiddleware for DlpMiddleware {
    fn handle<'a>(
        &'a self,
        ctx: RequestContext,
        req: ToolGateRequest,
        next: MethodNext<'a>,
    ) -> BoxFuture<'a, Result<ToolGateResult, ToolGateError>> {
        Box::pin(async move {
            if !self.config.enabled {
                return next.run(ctx, req).await;
            }
            let req = self.redact_request(req);
            let result = next.run(ctx, req).await?;
            Ok(self.redact_result(result))
        })
    }

    fn name(&self) -> &'static str {
        "dlp"
    }
}
