use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use toolgate_core::pipeline::{BoxFuture, ExecutionMiddleware, ExecutionNext};
use toolgate_core::request::ExecutionRequest;
use toolgate_core::{ExecutionResult, RequestContext, ToolGateError};
use toolgate_tokenizer::{estimate_value_tokens, CharRatioEstimator};

use crate::config::{CostMetric, RateLimitBackend, RateLimitConfigLayers, ResolvedScope};
use crate::limiter::RateLimiter;
use crate::local::LocalTokenBucket;
use crate::partition::partition_key;
use crate::redis_limiter::RedisTokenBucket;

/// The in-process limiter keys its own map, so `<scope>:<partition>` is
/// unambiguous on its own (spec.md §4.5). Redis is a namespace shared with
/// whatever else points at that instance, so its key carries the full
/// `ratelimit:<serviceId>:<scope>:<partition>` protocol spec.md §6 requires.
fn limiter_key(service_id: &str, scope: &ResolvedScope, partition: &str, backend: &RateLimitBackend) -> String {
    match backend {
        RateLimitBackend::Local => format!("{}:{partition}", scope.label()),
        RateLimitBackend::Redis { .. } => format!("ratelimit:{service_id}:{}:{partition}", scope.label()),
    }
}

fn connection_hash(url: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    hasher.finish()
}

struct CachedRedisLimiter {
    hash: u64,
    limiter: Arc<RedisTokenBucket>,
}

/// Token-bucket rate-limit middleware (spec.md §4.5). Holds one local
/// limiter shared across all in-memory buckets, and one cached Redis
/// limiter per distinct connection tuple (rebuilt on hot reload when the
/// tuple's hash changes).
pub struct RateLimitMiddleware {
    layers: RateLimitConfigLayers,
    local: Arc<LocalTokenBucket>,
    redis_limiters: DashMap<String, CachedRedisLimiter>,
    estimator: CharRatioEstimator,
}

impl RateLimitMiddleware {
    pub fn new(layers: RateLimitConfigLayers) -> Self {
        Self {
            layers,
            local: Arc::new(LocalTokenBucket::new()),
            redis_limiters: DashMap::new(),
            estimator: CharRatioEstimator::default(),
        }
    }

    async fn limiter_for(&self, backend: &RateLimitBackend) -> Result<Arc<dyn RateLimiter>, ToolGateError> {
        match backend {
            RateLimitBackend::Local => Ok(self.local.clone() as Arc<dyn RateLimiter>),
            RateLimitBackend::Redis { url } => {
                let hash = connection_hash(url);
                if let Some(cached) = self.redis_limiters.get(url) {
                    if cached.hash == hash {
                        return Ok(cached.limiter.clone() as Arc<dyn RateLimiter>);
                    }
                }
                let limiter = Arc::new(RedisTokenBucket::connect(url).await?);
                self.redis_limiters.insert(url.clone(), CachedRedisLimiter { hash, limiter: limiter.clone() });
                Ok(limiter as Arc<dyn RateLimiter>)
            }
        }
    }

    fn compute_cost(&self, cfg_metric: CostMetric, req: &mut ExecutionRequest) -> u64 {
        match cfg_metric {
            CostMetric::Fixed => 1,
            CostMetric::Tokens => match req.arguments() {
                Some(value) => estimate_value_tokens(value, &self.estimator) as u64,
                None => 1,
            },
        }
    }
}

impl ExecutionMiddleware for RateLimitMiddleware {
    fn execute<'a>(
        &'a self,
        ctx: RequestContext,
        mut req: ExecutionRequest,
        next: ExecutionNext<'a>,
    ) -> BoxFuture<'a, Result<ExecutionResult, ToolGateError>> {
        Box::pin(async move {
            let Some((scope, cfg)) = self.layers.resolve(&req.tool_name, &ctx.service_id) else {
                return next.run(ctx, req).await;
            };
            if !cfg.enabled {
                return next.run(ctx, req).await;
            }

            let limiter = match self.limiter_for(&cfg.backend).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(error = %e, "rate limiter construction failed, failing open");
                    return next.run(ctx, req).await;
                }
            };

            let cost = self.compute_cost(cfg.cost_metric, &mut req);
            let partition = partition_key(&ctx, cfg.partition);
            let key = limiter_key(&ctx.service_id, &scope, &partition, &cfg.backend);

            match limiter.allow_n(&key, cfg.rps, cfg.burst, cost).await {
                Ok(true) => next.run(ctx, req).await,
                Ok(false) => Err(ToolGateError::RateLimitExceeded(scope.error_message())),
                Err(e) => {
                    tracing::warn!(error = %e, "rate limit backend error, failing closed");
                    Err(ToolGateError::RateLimitExceeded("rate limit check failed".to_string()))
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "rate_limit"
    }
}
