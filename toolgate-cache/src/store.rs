use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;

/// Pluggable exact-cache backend (spec.md §4.3, §9: "no global singleton for
/// these — the corpus's own global cache-backend singleton is intentionally
/// not carried forward"; every middleware instance owns its own store).
pub trait CacheStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + 'a>>;
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Bytes,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Default in-memory cache store, DashMap-backed with lazy eviction on read.
#[derive(Clone)]
pub struct InMemoryCacheStore {
    inner: Arc<DashMap<String, (Bytes, Instant, Duration)>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(DashMap::new()) }
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(entry) = self.inner.get(key) {
                let (val, inserted, ttl) = entry.value();
                if inserted.elapsed() < *ttl {
                    return Some(val.clone());
                }
                drop(entry);
                self.inner.remove(key);
            }
            None
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Bytes,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.inner.insert(key.to_string(), (value, Instant::now(), ttl));
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.inner.remove(key);
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.inner.clear();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value_before_ttl_expiry() {
        let store = InMemoryCacheStore::new();
        store.set("k", Bytes::from_static(b"v"), Duration::from_secs(60)).await;
        assert_eq!(store.get("k").await, Some(Bytes::from_static(b"v")));
    }

    #[tokio::test]
    async fn get_misses_after_ttl_expiry() {
        let store = InMemoryCacheStore::new();
        store.set("k", Bytes::from_static(b"v"), Duration::from_millis(1)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn remove_evicts_the_key() {
        let store = InMemoryCacheStore::new();
        store.set("k", Bytes::from_static(b"v"), Duration::from_secs(60)).await;
        store.remove("k").await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn clear_evicts_every_key() {
        let store = InMemoryCacheStore::new();
        store.set("a", Bytes::from_static(b"1"), Duration::from_secs(60)).await;
        store.set("b", Bytes::from_static(b"2"), Duration::from_secs(60)).await;
        store.clear().await;
        assert_eq!(store.get("a").await, None);
        assert_eq!(store.get("b").await, None);
    }
}
