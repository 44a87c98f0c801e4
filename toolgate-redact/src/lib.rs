mod config;
mod middleware;
mod patterns;
mod redactor;
mod walker;

pub use config::DlpConfig;
pub use middleware::DlpMiddleware;
pub use patterns::{builtin_patterns, compile_custom_patterns, Pattern, PreCheck, SENTINEL};
pub use redactor::Redactor;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use toolgate_core::pipeline::{MethodPipeline, MethodUpstream};
    use toolgate_core::request::{ContentPart, PromptMessage, ResourceContent, ToolGateRequest, ToolGateResult};
    use toolgate_core::RequestContext;

    use super::*;

    fn upstream_echoing_tool_call() -> Box<MethodUpstream> {
        Box::new(|_ctx, req| {
            Box::pin(async move {
                match req {
                    ToolGateRequest::ToolCall { arguments, .. } => {
                        let text = String::from_utf8(arguments.to_vec()).unwrap();
                        Ok(ToolGateResult::ToolResult { content: vec![ContentPart::Text { text }] })
                    }
                    _ => unreachable!("test only drives ToolCall"),
                }
            })
        })
    }

    #[tokio::test]
    async fn tool_call_arguments_are_redacted_before_reaching_upstream() {
        let middleware = DlpMiddleware::new(DlpConfig { enabled: true, patterns: vec![] });
        let pipeline = MethodPipeline::new(vec![Arc::new(middleware)]);
        let upstream = upstream_echoing_tool_call();

        let req = ToolGateRequest::ToolCall {
            tool_name: "svc.tool".to_string(),
            arguments: bytes::Bytes::from(r#"{"email":"a@example.com"}"#),
        };
        let result = pipeline.run(RequestContext::new("req-1", "svc"), req, &upstream).await.unwrap();

        match result {
            ToolGateResult::ToolResult { content } => match &content[0] {
                ContentPart::Text { text } => assert_eq!(text, r#"{"email":"***REDACTED***"}"#),
                _ => panic!("expected text content"),
            },
            _ => panic!("expected tool result"),
        }
    }

    #[tokio::test]
    async fn tool_result_text_is_redacted_on_the_way_out() {
        let middleware = DlpMiddleware::new(DlpConfig { enabled: true, patterns: vec![] });
        let pipeline = MethodPipeline::new(vec![Arc::new(middleware)]);
        let upstream: Box<MethodUpstream> = Box::new(|_ctx, _req| {
            Box::pin(async move {
                Ok(ToolGateResult::ToolResult {
                    content: vec![
                        ContentPart::Text { text: "ssn 123-45-6789".to_string() },
                        ContentPart::Image { data: "xx".to_string(), mime_type: "image/png".to_string() },
                    ],
                })
            })
        });

        let req = ToolGateRequest::ToolCall {
            tool_name: "svc.tool".to_string(),
            arguments: bytes::Bytes::from(r#"{}"#),
        };
        let result = pipeline.run(RequestContext::new("req-1", "svc"), req, &upstream).await.unwrap();

        match result {
            ToolGateResult::ToolResult { content } => {
                match &content[0] {
                    ContentPart::Text { text } => assert_eq!(text, "ssn ***REDACTED***"),
                    _ => panic!("expected text content"),
                }
                match &content[1] {
                    ContentPart::Image { data, .. } => assert_eq!(data, "xx"),
                    _ => panic!("expected image content untouched"),
                }
            }
            _ => panic!("expected tool result"),
        }
    }

    #[tokio::test]
    async fn prompt_get_arguments_are_redacted_per_value() {
        let middleware = DlpMiddleware::new(DlpConfig { enabled: true, patterns: vec![] });
        let pipeline = MethodPipeline::new(vec![Arc::new(middleware)]);
        let upstream: Box<MethodUpstream> = Box::new(|_ctx, req| {
            Box::pin(async move {
                match req {
                    ToolGateRequest::PromptGet { arguments, .. } => Ok(ToolGateResult::PromptMessages {
                        messages: vec![PromptMessage {
                            role: "user".to_string(),
                            content: ContentPart::Text { text: arguments.get("note").cloned().unwrap_or_default() },
                        }],
                    }),
                    _ => unreachable!(),
                }
            })
        });

        let mut arguments = std::collections::BTreeMap::new();
        arguments.insert("note".to_string(), "email a@example.com".to_string());
        let req = ToolGateRequest::PromptGet { name: "p".to_string(), arguments };
        let result = pipeline.run(RequestContext::new("req-1", "svc"), req, &upstream).await.unwrap();

        match result {
            ToolGateResult::PromptMessages { messages } => match &messages[0].content {
                ContentPart::Text { text } => assert_eq!(text, "email ***REDACTED***"),
                _ => panic!("expected text content"),
            },
            _ => panic!("expected prompt messages"),
        }
    }

    #[tokio::test]
    async fn resource_contents_text_is_redacted() {
        let middleware = DlpMiddleware::new(DlpConfig { enabled: true, patterns: vec![] });
        let pipeline = MethodPipeline::new(vec![Arc::new(middleware)]);
        let upstream: Box<MethodUpstream> = Box::new(|_ctx, _req| {
            Box::pin(async move {
                Ok(ToolGateResult::ResourceContents {
                    contents: vec![ResourceContent {
                        uri: "file://x".to_string(),
                        content: ContentPart::Text { text: "contact a@example.com".to_string() },
                    }],
                })
            })
        });

        let req = ToolGateRequest::ResourceRead { uri: "file://x".to_string() };
        let result = pipeline.run(RequestContext::new("req-1", "svc"), req, &upstream).await.unwrap();

        match result {
            ToolGateResult::ResourceContents { contents } => match &contents[0].content {
                ContentPart::Text { text } => assert_eq!(text, "contact ***REDACTED***"),
                _ => panic!("expected text content"),
            },
            _ => panic!("expected resource contents"),
        }
    }

    #[tokio::test]
    async fn disabled_middleware_passes_everything_through_untouched() {
        let middleware = DlpMiddleware::new(DlpConfig { enabled: false, patterns: vec![] });
        let pipeline = MethodPipeline::new(vec![Arc::new(middleware)]);
        let upstream = upstream_echoing_tool_call();

        let req = ToolGateRequest::ToolCall {
            tool_name: "svc.tool".to_string(),
            arguments: bytes::Bytes::from(r#"{"email":"a@example.com"}"#),
        };
        let result = pipeline.run(RequestContext::new("req-1", "svc"), req, &upstream).await.unwrap();

        match result {
            ToolGateResult::ToolResult { content } => match &content[0] {
                ContentPart::Text { text } => assert_eq!(text, r#"{"email":"a@example.com"}"#),
                _ => panic!("expected text content"),
            },
            _ => panic!("expected tool result"),
        }
    }
}
