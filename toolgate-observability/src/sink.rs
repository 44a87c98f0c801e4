use std::sync::Arc;

/// Bridges tool-execution observations out of this crate (spec.md §4.9):
/// request/response byte sizes, token counts, duration, completion counts,
/// and in-flight gauges. The crate never owns a metrics registry itself —
/// emission to `tracing` always happens regardless of this trait; a
/// production embedder implements `MetricsSink` to additionally bridge to
/// Prometheus or OTLP (mirroring the corpus's split between
/// `r2e-observability`'s tracing-only layer and `r2e-prometheus`'s registry
/// plugin). Every method has a no-op default so a sink can implement only
/// the signals it cares about.
pub trait MetricsSink: Send + Sync {
    fn observe_request_bytes(&self, _tool_name: &str, _bytes: usize) {}
    fn observe_response_bytes(&self, _tool_name: &str, _bytes: usize) {}
    fn observe_input_tokens(&self, _tool_name: &str, _tokens: usize) {}
    fn observe_output_tokens(&self, _tool_name: &str, _tokens: usize) {}
    fn observe_duration(&self, _tool_name: &str, _status: &str, _seconds: f64) {}
    fn inc_completion(&self, _tool_name: &str, _status: &str, _error_kind: &str) {}
    fn inc_in_flight(&self, _tool_name: &str) {}
    fn dec_in_flight(&self, _tool_name: &str) {}
}

/// The default sink: every observation is dropped, relying entirely on the
/// `tracing` events the metrics middleware always emits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {}

/// Increments an in-flight gauge on construction and decrements it on drop
/// (RAII, not a manual defer — spec.md §4.9), so a panic or early return
/// mid-execution still balances the gauge.
pub struct InFlightGuard {
    sink: Arc<dyn MetricsSink>,
    tool_name: String,
}

impl InFlightGuard {
    pub fn new(sink: Arc<dyn MetricsSink>, tool_name: String) -> Self {
        sink.inc_in_flight(&tool_name);
        Self { sink, tool_name }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.sink.dec_in_flight(&self.tool_name);
    }
}
