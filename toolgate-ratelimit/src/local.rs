use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::Mutex;
use toolgate_core::ToolGateError;

use crate::limiter::RateLimiter;

/// `tokens = min(burst, tokens + rps * elapsed)` refilled lazily on each call
/// (spec.md §3). One bucket per key, created on first use with a full
/// bucket.
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(burst: f64) -> Self {
        Self { tokens: burst, last_refill: Instant::now() }
    }

    fn refill_and_try_consume(&mut self, rps: f64, burst: f64, cost: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + rps * elapsed).min(burst);
        self.last_refill = now;

        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }
}

/// Wait-free, mutex-guarded local token bucket per key. No I/O.
#[derive(Default)]
pub struct LocalTokenBucket {
    buckets: DashMap<String, Mutex<Bucket>>,
}

impl LocalTokenBucket {
    pub fn new() -> Self {
        Self { buckets: DashMap::new() }
    }
}

#[async_trait::async_trait]
impl RateLimiter for LocalTokenBucket {
    async fn allow_n(&self, key: &str, rps: f64, burst: f64, cost: u64) -> Result<bool, ToolGateError> {
        let entry = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(Bucket::new(burst)));
        let mut bucket = entry.lock().await;
        Ok(bucket.refill_and_try_consume(rps, burst, cost as f64))
    }

    async fn update(&self, key: &str, rps: f64, burst: f64) {
        let entry = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(Bucket::new(burst)));
        let mut bucket = entry.lock().await;
        bucket.tokens = bucket.tokens.min(burst);
        let _ = rps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_burst_then_blocks() {
        let limiter = LocalTokenBucket::new();
        for _ in 0..5 {
            assert!(limiter.allow("k", 1.0, 5.0).await.unwrap());
        }
        assert!(!limiter.allow("k", 1.0, 5.0).await.unwrap());
    }

    #[tokio::test]
    async fn distinct_keys_have_independent_buckets() {
        let limiter = LocalTokenBucket::new();
        for _ in 0..3 {
            assert!(limiter.allow("a", 1.0, 3.0).await.unwrap());
        }
        assert!(!limiter.allow("a", 1.0, 3.0).await.unwrap());
        assert!(limiter.allow("b", 1.0, 3.0).await.unwrap());
    }

    #[tokio::test]
    async fn refills_over_time() {
        let limiter = LocalTokenBucket::new();
        assert!(limiter.allow("k", 1000.0, 1.0).await.unwrap());
        assert!(!limiter.allow("k", 1000.0, 1.0).await.unwrap());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(limiter.allow("k", 1000.0, 1.0).await.unwrap());
    }

    #[tokio::test]
    async fn allow_n_consumes_requested_cost() {
        let limiter = LocalTokenBucket::new();
        assert!(limiter.allow_n("k", 1.0, 10.0, 7).await.unwrap());
        assert!(!limiter.allow_n("k", 1.0, 10.0, 4).await.unwrap());
        assert!(limiter.allow_n("k", 1.0, 10.0, 3).await.unwrap());
    }
}
