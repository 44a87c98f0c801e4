use std::time::{SystemTime, UNIX_EPOCH};

use redis::Script;
use toolgate_core::ToolGateError;

use crate::limiter::RateLimiter;

/// Refills, caps at burst, and conditionally subtracts `cost`, all in one
/// round trip so concurrent callers across processes never race (spec.md
/// §4.5). `KEYS[1]` holds a hash `{tokens, ts}`; TTL is sized generously
/// past how long a bucket could sit idle and still matter for refill.
const BUCKET_SCRIPT: &str = r#"
local key = KEYS[1]
local rps = tonumber(ARGV[1])
local burst = tonumber(ARGV[2])
local now_us = tonumber(ARGV[3])
local cost = tonumber(ARGV[4])

local data = redis.call("HMGET", key, "tokens", "ts")
local tokens = tonumber(data[1])
local last_ts = tonumber(data[2])

if tokens == nil then
    tokens = burst
    last_ts = now_us
end

local elapsed = math.max(0, now_us - last_ts) / 1000000.0
tokens = math.min(burst, tokens + rps * elapsed)

local allowed = 0
if tokens >= cost then
    tokens = tokens - cost
    allowed = 1
end

redis.call("HMSET", key, "tokens", tokens, "ts", now_us)
local ttl = math.ceil(burst / math.max(rps, 0.001)) + 60
redis.call("EXPIRE", key, ttl)

return allowed
"#;

/// Redis-backed token bucket: the refill/consume/store sequence runs
/// atomically server-side via the script above (EVALSHA with EVAL
/// fallback, handled internally by [`redis::Script`]).
pub struct RedisTokenBucket {
    manager: redis::aio::ConnectionManager,
    script: Script,
}

impl RedisTokenBucket {
    pub async fn connect(url: &str) -> Result<Self, ToolGateError> {
        let client = redis::Client::open(url)
            .map_err(|e| ToolGateError::ConfigInvalid(format!("redis rate-limit url: {e}")))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("redis connect: {e}")))?;
        Ok(Self { manager, script: Script::new(BUCKET_SCRIPT) })
    }
}

#[async_trait::async_trait]
impl RateLimiter for RedisTokenBucket {
    async fn allow_n(&self, key: &str, rps: f64, burst: f64, cost: u64) -> Result<bool, ToolGateError> {
        let now_us = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);

        let mut conn = self.manager.clone();
        let result: i64 = self
            .script
            .key(key)
            .arg(rps)
            .arg(burst)
            .arg(now_us)
            .arg(cost)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("rate limit check failed: {e}")))?;

        match result {
            1 => Ok(true),
            0 => Ok(false),
            other => Err(ToolGateError::Internal(format!(
                "rate limit script returned unexpected value: {other}"
            ))),
        }
    }

    async fn update(&self, _key: &str, _rps: f64, _burst: f64) {
        // Redis buckets read rps/burst fresh from config on every call; there
        // is no cached per-key rate to retune.
    }
}
