use std::collections::HashMap;

use serde::Deserialize;

fn default_burst() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    Ip,
    User,
    ApiKey,
    Global,
}

impl Default for PartitionStrategy {
    fn default() -> Self {
        PartitionStrategy::Global
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostMetric {
    #[default]
    Fixed,
    Tokens,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateLimitBackend {
    Local,
    Redis { url: String },
}

impl Default for RateLimitBackend {
    fn default() -> Self {
        RateLimitBackend::Local
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub rps: f64,
    #[serde(default = "default_burst")]
    pub burst: f64,
    #[serde(default)]
    pub partition: PartitionStrategy,
    #[serde(default)]
    pub cost_metric: CostMetric,
    #[serde(default)]
    pub backend: RateLimitBackend,
}

/// Tool-over-service layering (spec.md §4.5): a tool-scoped entry, if
/// present, is used in full; otherwise the service-scoped entry applies.
/// Unlike the cache crate's config, there is no third, instance-wide
/// default layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitConfigLayers {
    #[serde(default)]
    pub tool: HashMap<String, RateLimitConfig>,
    #[serde(default)]
    pub service: HashMap<String, RateLimitConfig>,
}

/// Which scope the resolved config came from, used to build both the
/// limiter cache key and the block-message scope label.
#[derive(Debug, Clone)]
pub enum ResolvedScope {
    Tool(String),
    Service(String),
}

impl ResolvedScope {
    pub fn label(&self) -> String {
        match self {
            ResolvedScope::Tool(name) => format!("tool:{name}"),
            ResolvedScope::Service(id) => format!("service:{id}"),
        }
    }

    pub fn error_message(&self) -> String {
        match self {
            ResolvedScope::Tool(name) => format!("rate limit exceeded for tool {name}"),
            ResolvedScope::Service(id) => format!("rate limit exceeded for service {id}"),
        }
    }
}

impl RateLimitConfigLayers {
    pub fn resolve(&self, tool_name: &str, service_id: &str) -> Option<(ResolvedScope, &RateLimitConfig)> {
        if let Some(cfg) = self.tool.get(tool_name) {
            return Some((ResolvedScope::Tool(tool_name.to_string()), cfg));
        }
        if let Some(cfg) = self.service.get(service_id) {
            return Some((ResolvedScope::Service(service_id.to_string()), cfg));
        }
        None
    }
}
