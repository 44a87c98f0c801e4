use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use redis::AsyncCommands;
use toolgate_core::ToolGateError;

use crate::store::CacheStore;

/// Redis-backed exact cache. All storage errors are logged by the caller and
/// treated as non-fatal misses (spec.md §4.3 step 3).
#[derive(Clone)]
pub struct RedisCacheStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(url: &str) -> Result<Self, ToolGateError> {
        let client = redis::Client::open(url)
            .map_err(|e| ToolGateError::ConfigInvalid(format!("redis cache url: {e}")))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| ToolGateError::BackendUnavailable(format!("redis connect: {e}")))?;
        Ok(Self { manager })
    }
}

impl CacheStore for RedisCacheStore {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.manager.clone();
            match conn.get::<_, Option<Vec<u8>>>(key).await {
                Ok(Some(bytes)) => Some(Bytes::from(bytes)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "redis cache get failed, treating as miss");
                    None
                }
            }
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Bytes,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.manager.clone();
            let seconds = ttl.as_secs().max(1);
            if let Err(e) = conn.set_ex::<_, _, ()>(key, value.to_vec(), seconds).await {
                tracing::warn!(error = %e, "redis cache set failed");
            }
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.manager.clone();
            if let Err(e) = conn.del::<_, ()>(key).await {
                tracing::warn!(error = %e, "redis cache delete failed");
            }
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        // No namespace-wide FLUSHDB: this store does not own the whole Redis
        // keyspace. Whole-scope clears are a vector-store-only operation
        // (spec.md §9 open question); exact-cache clear is a deliberate no-op.
        Box::pin(async move {
            tracing::debug!("redis cache store does not support clear(); no-op");
        })
    }
}
