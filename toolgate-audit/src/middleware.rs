use std::time::Instant;

use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};

use crate::backend::AuditBackend;
use crate::chain::AuditChain;
use crate::config::AuditConfig;

/// Records one [`crate::record::AuditRecord`] per tool call (spec.md §4.6).
/// A write failure is logged and, unless `strict` is set, never fails the
/// request it describes.
pub struct AuditMiddleware {
    config: AuditConfig,
    backend: Box<dyn AuditBackend>,
    chain: AuditChain,
}

impl AuditMiddleware {
    pub fn new(config: AuditConfig, backend: Box<dyn AuditBackend>, chain: AuditChain) -> Self {
        Self { config, backend, chain }
    }
}

impl ExecutionMiddleware for AuditMiddleware {
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

            let tool_name = req.tool_name.clone();
            let user_id = ctx.user_id.clone();
            let profile_id = ctx.profile_id.clone();
            let args = if self.config.log_arguments { req.arguments().cloned() } else { None };

            let started = Instant::now();
            let outcome = next.run(ctx, req).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let (result_for_log, error_for_log) = match &outcome {
                Ok(value) => (self.config.log_results.then(|| value.clone()), None),
                Err(e) => (None, Some(e.to_string())),
            };

            let record = self
                .chain
                .next_record(tool_name, user_id, profile_id, args, result_for_log, error_for_log, duration_ms)
                .await;

            if let Err(e) = self.backend.append(&record).await {
                if self.config.strict {
                    return Err(e);
                }
                tracing::warn!(error = %e, audit_id = record.id, "failed to write audit record");
            }

            outcome
        })
    }

    fn name(&self) -> &'static str {
        "audit"
    }
}
