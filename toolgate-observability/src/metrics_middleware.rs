use std::sync::Arc;
use std::time::Instant;

use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};
use toolgate_tokenizer::{byte_size, estimate_value_tokens, CharRatioEstimator, TokenEstimator};

use crate::sink::{InFlightGuard, MetricsSink};

/// Observes the signals listed in spec.md §4.9 around every tool execution:
/// byte sizes, token counts, duration, completion count, and an in-flight
/// gauge. Always emits a structured `tracing` event; additionally forwards
/// to the injected [`MetricsSink`].
pub struct MetricsMiddleware {
    sink: Arc<dyn MetricsSink>,
    estimator: CharRatioEstimator,
}

impl MetricsMiddleware {
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self { sink, estimator: CharRatioEstimator::default() }
    }
}

impl ExecutionMiddleware for MetricsMiddleware {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        mut req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        Box::pin(async move {
            let tool_name = req.tool_name.clone();
            let service_id = ctx.service_id.clone();
            let _in_flight = InFlightGuard::new(self.sink.clone(), tool_name.clone());

            let request_bytes = req.tool_inputs().len();
            let input_tokens =
                req.arguments().map(|v| estimate_value_tokens(v, &self.estimator as &dyn TokenEstimator)).unwrap_or(0);
            self.sink.observe_request_bytes(&tool_name, request_bytes);
            self.sink.observe_input_tokens(&tool_name, input_tokens);

            let start = Instant::now();
            let outcome = next.run(ctx, req).await;
            let duration = start.elapsed().as_secs_f64();

            let (status, error_kind) = match &outcome {
                Ok(_) => ("success", "none"),
                Err(e) => ("error", e.kind_label()),
            };
            self.sink.observe_duration(&tool_name, status, duration);
            self.sink.inc_completion(&tool_name, status, error_kind);

            let mut response_bytes = 0usize;
            let mut output_tokens = 0usize;
            if let Ok(value) = &outcome {
                response_bytes = byte_size(value);
                output_tokens = estimate_value_tokens(value, &self.estimator as &dyn TokenEstimator);
                self.sink.observe_response_bytes(&tool_name, response_bytes);
                self.sink.observe_output_tokens(&tool_name, output_tokens);
            }

            tracing::info!(
                tool = %tool_name,
                service = %service_id,
                status,
                error_kind,
                duration_ms = duration * 1000.0,
                request_bytes,
                response_bytes,
                input_tokens,
                output_tokens,
                "tool execution completed"
            );

            outcome
        })
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}
