//! Convenience registration of the middlewares that need nothing beyond
//! their own configuration blob (spec.md §4.1: factories are registered once
//! at process start). Middlewares whose contract names an external
//! collaborator — call-policy's [`toolgate_policy::CallPolicyProvider`],
//! the SSO gate's [`toolgate_policy::SsoValidator`], audit's
//! [`toolgate_audit::AuditBackend`], recovery's
//! [`toolgate_recovery::RecoveryLlmClientFactory`] — are registered by the
//! embedder directly via [`toolgate_core::Registry::register_execution`],
//! since this crate has no instance of those collaborators to hand them.
//!
//! Priorities below follow the inbound flow sketched in spec.md §2 (logging
//! → auth → RBAC → DLP → metrics → rate-limit → caching → call-policy →
//! audit → smart-recovery). Method-kind and execution-kind middlewares sort
//! independently within their own chain; the numbers are shared so the
//! relative order reads the same across both.

use std::sync::Arc;

use toolgate_core::pipeline::{ExecutionMiddleware, MethodMiddleware};
use toolgate_core::registry::Registry;

#[cfg(feature = "observability")]
use toolgate_observability::{MetricsSink, NoopMetricsSink};

pub const PRIORITY_TRACING: i32 = 10;
pub const PRIORITY_GUARDRAIL: i32 = 25;
pub const PRIORITY_RBAC: i32 = 30;
pub const PRIORITY_DLP: i32 = 40;
pub const PRIORITY_METRICS: i32 = 50;
pub const PRIORITY_RATELIMIT: i32 = 60;
pub const PRIORITY_CACHE: i32 = 70;
pub const PRIORITY_CONTEXT: i32 = 110;

/// Registers every middleware buildable from its config blob alone, using a
/// no-op metrics sink. Use [`register_stock_middlewares_with_sink`] to bridge
/// metrics into a real registry (Prometheus, OTLP, ...).
#[cfg(feature = "observability")]
pub fn register_stock_middlewares(registry: &Registry) {
    register_stock_middlewares_with_sink(registry, Arc::new(NoopMetricsSink));
}

#[cfg(feature = "observability")]
pub fn register_stock_middlewares_with_sink(registry: &Registry, sink: Arc<dyn MetricsSink>) {
    register_non_metrics_middlewares(registry);

    registry.register_execution(
        "metrics",
        PRIORITY_METRICS,
        move |_cfg| {
            Ok(Arc::new(toolgate_observability::MetricsMiddleware::new(sink.clone()))
                as Arc<dyn ExecutionMiddleware>)
        },
    );
}

#[cfg(not(feature = "observability"))]
pub fn register_stock_middlewares(registry: &Registry) {
    register_non_metrics_middlewares(registry);
}

fn register_non_metrics_middlewares(registry: &Registry) {
    #[cfg(feature = "observability")]
    registry.register_execution(
        "tracing",
        PRIORITY_TRACING,
        |_cfg| {
            Ok(Arc::new(toolgate_observability::TracingMiddleware::new())
                as Arc<dyn ExecutionMiddleware>)
        },
    );

    #[cfg(feature = "policy")]
    registry.register_method(
        "guardrail",
        PRIORITY_GUARDRAIL,
        |cfg| {
            let config = serde_json::from_value(cfg.clone())?;
            Ok(Arc::new(toolgate_policy::GuardrailMiddleware::new(config)) as Arc<dyn MethodMiddleware>)
        },
    );

    #[cfg(feature = "policy")]
    registry.register_execution(
        "rbac",
        PRIORITY_RBAC,
        |cfg| {
            let config = serde_json::from_value(cfg.clone())?;
            Ok(Arc::new(toolgate_policy::RbacMiddleware::new(config)) as Arc<dyn ExecutionMiddleware>)
        },
    );

    #[cfg(feature = "redact")]
    registry.register_method(
        "dlp",
        PRIORITY_DLP,
        |cfg| {
            let config = serde_json::from_value(cfg.clone())?;
            Ok(Arc::new(toolgate_redact::DlpMiddleware::new(config)) as Arc<dyn MethodMiddleware>)
        },
    );

    #[cfg(feature = "ratelimit")]
    registry.register_execution(
        "rate-limit",
        PRIORITY_RATELIMIT,
        |cfg| {
            let layers = serde_json::from_value(cfg.clone())?;
            Ok(Arc::new(toolgate_ratelimit::RateLimitMiddleware::new(layers)) as Arc<dyn ExecutionMiddleware>)
        },
    );

    #[cfg(feature = "cache")]
    registry.register_execution(
        "cache",
        PRIORITY_CACHE,
        |cfg| {
            let layers = serde_json::from_value(cfg.clone())?;
            Ok(Arc::new(toolgate_cache::CacheMiddleware::new(layers)) as Arc<dyn ExecutionMiddleware>)
        },
    );

    #[cfg(feature = "context")]
    registry.register_execution(
        "context-optimizer",
        PRIORITY_CONTEXT,
        |cfg| {
            let config = serde_json::from_value(cfg.clone())?;
            Ok(Arc::new(toolgate_context::ContextMiddleware::new(config)) as Arc<dyn ExecutionMiddleware>)
        },
    );
}
