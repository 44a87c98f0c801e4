use tracing::Instrument;

use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};

/// Starts a span per tool execution carrying tool name and service id,
/// records status and error on completion (spec.md §4.9). Grounded on
/// `OtelTraceLayer`'s request-span pattern, adapted for async/await via
/// `Instrument` rather than holding an entered span guard across `.await`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionMiddleware for TracingMiddleware {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        let span = tracing::info_span!(
            "tool_execution",
            tool = %req.tool_name,
            service = %ctx.service_id,
            status = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        Box::pin(
            async move {
                let outcome = next.run(ctx, req).await;
                match &outcome {
                    Ok(_) => {
                        tracing::Span::current().record("status", "success");
                    }
                    Err(e) => {
                        tracing::Span::current().record("status", "error");
                        tracing::Span::current().record("error", tracing::field::display(e));
                    }
                }
                outcome
            }
            .instrument(span),
        )
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use toolgate_core::pipeline::{ExecutionPipeline, ExecutionUpstream};
    use toolgate_core::request::ExecutionRequest as Req;

    use super::*;

    #[tokio::test]
    async fn passes_success_through_unchanged() {
        let mws: Vec<Arc<dyn ExecutionMiddleware>> = vec![Arc::new(TracingMiddleware::new())];
        let pipeline = ExecutionPipeline::new(mws);
        let upstream: Box<ExecutionUpstream> =
            Box::new(|_ctx, _req| Box::pin(async move { Ok(serde_json::json!({"ok": true})) }));
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));

        let result = pipeline.run(ctx, req, &upstream).await.unwrap();
        assert_eq!(result, serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn passes_errors_through_unchanged() {
        let mws: Vec<Arc<dyn ExecutionMiddleware>> = vec![Arc::new(TracingMiddleware::new())];
        let pipeline = ExecutionPipeline::new(mws);
        let upstream: Box<ExecutionUpstream> =
            Box::new(|_ctx, _req| Box::pin(async move { Err(ToolGateError::Internal("oops".to_string())) }));
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));

        let result = pipeline.run(ctx, req, &upstream).await;
        assert!(matches!(result, Err(ToolGateError::Internal(msg)) if msg == "oops"));
    }
}
