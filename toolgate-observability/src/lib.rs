mod metrics_middleware;
mod sink;
mod tracing_middleware;

pub use metrics_middleware::MetricsMiddleware;
pub use sink::{InFlightGuard, MetricsSink, NoopMetricsSink};
pub use tracing_middleware::TracingMiddleware;
