use toolgate_core::ToolGateError;

/// Shared contract for token-bucket rate limiters (spec.md §4.5).
///
/// `allow` is sugar for `allow_n(1)`. `update` retunes an existing bucket's
/// rate and capacity in place without resetting its current token level,
/// used by hot reload for local limiters.
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    async fn allow(&self, key: &str, rps: f64, burst: f64) -> Result<bool, ToolGateError> {
        self.allow_n(key, rps, burst, 1).await
    }

    async fn allow_n(&self, key: &str, rps: f64, burst: f64, cost: u64) -> Result<bool, ToolGateError>;

    async fn update(&self, key: &str, rps: f64, burst: f64);
}
