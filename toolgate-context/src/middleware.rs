use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};

use crate::config::ContextConfig;
use crate::optimizer::optimize_result;

/// Buffers the full result (no streamed-response support; see DESIGN.md) and
/// caps oversized `content[*].text` entries (spec.md §4.8, C12).
pub struct ContextMiddleware {
    config: ContextConfig,
}

impl ContextMiddleware {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }
}

impl ExecutionMiddleware for ContextMiddleware {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        Box::pin(async move {
            let result = next.run(ctx, req).await?;
            if !self.config.enabled {
                return Ok(result);
            }
            Ok(optimize_result(&result, self.config.max_chars))
        })
    }

    fn name(&self) -> &'static str {
        "context-optimizer"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use toolgate_core::pipeline::{ExecutionPipeline, ExecutionUpstream};
    use toolgate_core::request::ExecutionRequest as Req;

    use super::*;

    fn upstream_returning(value: serde_json::Value) -> Box<ExecutionUpstream> {
        Box::new(move |_ctx, _req| {
            let value = value.clone();
            Box::pin(async move { Ok(value) })
        })
    }

    #[tokio::test]
    async fn truncates_when_enabled() {
        let mws: Vec<Arc<dyn ExecutionMiddleware>> =
            vec![Arc::new(ContextMiddleware::new(ContextConfig { enabled: true, max_chars: 4 }))];
        let pipeline = ExecutionPipeline::new(mws);
        let upstream = upstream_returning(serde_json::json!({"content": [{"type": "text", "text": "abcdefghij"}]}));
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));

        let result = pipeline.run(ctx, req, &upstream).await.unwrap();
        assert_eq!(result, serde_json::json!({"content": [{"type": "text", "text": "abcd...[TRUNCATED]"}]}));
    }

    #[tokio::test]
    async fn passes_through_when_disabled() {
        let mws: Vec<Arc<dyn ExecutionMiddleware>> =
            vec![Arc::new(ContextMiddleware::new(ContextConfig { enabled: false, max_chars: 4 }))];
        let pipeline = ExecutionPipeline::new(mws);
        let value = serde_json::json!({"content": [{"type": "text", "text": "abcdefghij"}]});
        let upstream = upstream_returning(value.clone());
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));

        let result = pipeline.run(ctx, req, &upstream).await.unwrap();
        assert_eq!(result, value);
    }
}
