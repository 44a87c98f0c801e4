use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};

/// The tool manager's compiled rule set for a service, evaluated against
/// `(toolName, userId, argumentsJSON)` (spec.md §4.10). An external
/// collaborator — this crate never compiles or stores rules itself.
#[async_trait::async_trait]
pub trait CallPolicyProvider: Send + Sync {
    /// `None` means the tool manager has no compiled rules for this service
    /// at all (fail-closed); `Some(true)`/`Some(false)` is an explicit
    /// allow/deny verdict.
    async fn evaluate(
        &self,
        service_id: &str,
        tool_name: &str,
        user_id: Option<&str>,
        arguments: &Value,
    ) -> Option<bool>;
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CallPolicyConfig {
    #[serde(default)]
    pub enabled: bool,
}

pub struct CallPolicyMiddleware {
    config: CallPolicyConfig,
    provider: Box<dyn CallPolicyProvider>,
    denied_count: AtomicU64,
}

impl CallPolicyMiddleware {
    pub fn new(config: CallPolicyConfig, provider: Box<dyn CallPolicyProvider>) -> Self {
        Self { config, provider, denied_count: AtomicU64::new(0) }
    }

    pub fn denied_count(&self) -> u64 {
        self.denied_count.load(Ordering::Relaxed)
    }
}

impl ExecutionMiddleware for CallPolicyMiddleware {
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

            let arguments = req.arguments().cloned().unwrap_or_else(|| serde_json::json!({}));
            let verdict =
                self.provider.evaluate(&ctx.service_id, &req.tool_name, ctx.user_id.as_deref(), &arguments).await;

            match verdict {
                Some(true) => next.run(ctx, req).await,
                Some(false) => {
                    self.denied_count.fetch_add(1, Ordering::Relaxed);
                    Err(ToolGateError::PolicyDenied(format!(
                        "call policy denied for tool {}",
                        req.tool_name
                    )))
                }
                None => {
                    self.denied_count.fetch_add(1, Ordering::Relaxed);
                    Err(ToolGateError::PolicyDenied(format!(
                        "no call-policy rules for service {}",
                        ctx.service_id
                    )))
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "call-policy"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use toolgate_core::pipeline::{ExecutionPipeline, ExecutionUpstream};
    use toolgate_core::request::ExecutionRequest as Req;

    use super::*;

    struct FixedProvider(Option<bool>);

    #[async_trait::async_trait]
    impl CallPolicyProvider for FixedProvider {
        async fn evaluate(&self, _service_id: &str, _tool_name: &str, _user_id: Option<&str>, _args: &Value) -> Option<bool> {
            self.0
        }
    }

    fn upstream_ok() -> Box<ExecutionUpstream> {
        Box::new(|_ctx, _req| Box::pin(async move { Ok(serde_json::json!({"ok": true})) }))
    }

    #[tokio::test]
    async fn allows_when_provider_returns_some_true() {
        let middleware =
            CallPolicyMiddleware::new(CallPolicyConfig { enabled: true }, Box::new(FixedProvider(Some(true))));
        let mws: Vec<Arc<dyn ExecutionMiddleware>> = vec![Arc::new(middleware)];
        let pipeline = ExecutionPipeline::new(mws);
        let upstream = upstream_ok();
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));

        assert!(pipeline.run(ctx, req, &upstream).await.is_ok());
    }

    #[tokio::test]
    async fn denies_when_provider_returns_some_false() {
        let middleware =
            CallPolicyMiddleware::new(CallPolicyConfig { enabled: true }, Box::new(FixedProvider(Some(false))));
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));
        let next = toolgate_core::pipeline::ExecutionNext::new(&[], &upstream_ok());
        let result = middleware.execute(ctx, req, next).await;
        assert!(matches!(result, Err(ToolGateError::PolicyDenied(_))));
    }

    #[tokio::test]
    async fn fails_closed_when_provider_has_no_rules_for_service() {
        let middleware = CallPolicyMiddleware::new(CallPolicyConfig { enabled: true }, Box::new(FixedProvider(None)));
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));
        let next = toolgate_core::pipeline::ExecutionNext::new(&[], &upstream_ok());
        let result = middleware.execute(ctx, req, next).await;
        assert!(matches!(result, Err(ToolGateError::PolicyDenied(_))));
        assert_eq!(middleware.denied_count(), 1);
    }

    #[tokio::test]
    async fn disabled_middleware_bypasses_the_provider_entirely() {
        let middleware =
            CallPolicyMiddleware::new(CallPolicyConfig { enabled: false }, Box::new(FixedProvider(Some(false))));
        let ctx = RequestContext::new("r1", "svc");
        let req = Req::new("svc.tool", Bytes::from_static(b"{}"));
        let next = toolgate_core::pipeline::ExecutionNext::new(&[], &upstream_ok());
        assert!(middleware.execute(ctx, req, next).await.is_ok());
    }
}
