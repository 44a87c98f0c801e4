//! Token-bucket rate limiting, local and Redis-backed, partitioned by caller
//! identity and scoped tool-over-service (spec.md C6, C7).

mod config;
mod limiter;
mod local;
mod middleware;
mod partition;
mod redis_limiter;

pub use config::{
    CostMetric, PartitionStrategy, RateLimitBackend, RateLimitConfig, RateLimitConfigLayers, ResolvedScope,
};
pub use limiter::RateLimiter;
pub use local::LocalTokenBucket;
pub use middleware::RateLimitMiddleware;
pub use partition::partition_key;
pub use redis_limiter::RedisTokenBucket;
