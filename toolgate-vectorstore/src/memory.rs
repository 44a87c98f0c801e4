use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use toolgate_core::ToolGateError;

use crate::{check_dimension, cosine_similarity, is_expired, normalize, VectorHit, VectorStore};

struct Record {
    vector: Vec<f32>,
    value: Value,
    expires_at: SystemTime,
    last_access: SystemTime,
}

/// Linear-scan in-memory vector store, one `Vec<Record>` per scope.
///
/// Expired records are filtered out during every scan. When a scope grows
/// past `compaction_threshold`, expired records are swept out; if the scope
/// is still over `capacity_per_scope` after the sweep, the least-recently
/// accessed records are evicted until it fits (spec.md §4.4: "capacity bound
/// configured at construction, LRU-style eviction when exceeded").
///
/// Each scope's vector dimension is fixed by its first `add` (spec.md §3);
/// later calls with a differently-sized vector are rejected rather than
/// silently truncated by [`cosine_similarity`].
pub struct InMemoryVectorStore {
    scopes: RwLock<HashMap<String, Vec<Record>>>,
    dimensions: RwLock<HashMap<String, usize>>,
    capacity_per_scope: usize,
    compaction_threshold: usize,
}

impl InMemoryVectorStore {
    pub fn new(capacity_per_scope: usize) -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            dimensions: RwLock::new(HashMap::new()),
            capacity_per_scope,
            compaction_threshold: capacity_per_scope.saturating_mul(2).max(capacity_per_scope + 1),
        }
    }

    fn compact_locked(records: &mut Vec<Record>, capacity: usize) {
        records.retain(|r| !is_expired(r.expires_at));
        if records.len() > capacity {
            records.sort_by_key(|r| r.last_access);
            let excess = records.len() - capacity;
            records.drain(0..excess);
        }
    }
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(
        &self,
        scope: &str,
        vector: Vec<f32>,
        value: Value,
        ttl: Duration,
    ) -> Result<(), ToolGateError> {
        let mut dimensions = self.dimensions.write().unwrap();
        let dim = check_dimension(dimensions.get(scope).copied(), vector.len(), scope)?;
        dimensions.insert(scope.to_string(), dim);
        drop(dimensions);

        let now = SystemTime::now();
        let record = Record {
            vector: normalize(&vector),
            value,
            expires_at: now + ttl,
            last_access: now,
        };

        let mut scopes = self.scopes.write().unwrap();
        let records = scopes.entry(scope.to_string()).or_default();
        records.push(record);

        if records.len() > self.compaction_threshold {
            Self::compact_locked(records, self.capacity_per_scope);
        }
        Ok(())
    }

    async fn search(
        &self,
        scope: &str,
        query: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<VectorHit>, ToolGateError> {
        if let Some(dim) = self.dimensions.read().unwrap().get(scope).copied() {
            check_dimension(Some(dim), query.len(), scope)?;
        }

        let query = normalize(query);
        let now = SystemTime::now();

        let mut scopes = self.scopes.write().unwrap();
        let Some(records) = scopes.get_mut(scope) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(usize, f32)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| !is_expired(r.expires_at))
            .map(|(i, r)| (i, cosine_similarity(&query, &r.vector)))
            .filter(|(_, sim)| *sim >= threshold)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        let hits = scored
            .iter()
            .map(|(i, sim)| VectorHit { value: records[*i].value.clone(), similarity: *sim })
            .collect();

        for (i, _) in &scored {
            records[*i].last_access = now;
        }

        Ok(hits)
    }

    async fn clear(&self) -> Result<(), ToolGateError> {
        self.scopes.write().unwrap().clear();
        self.dimensions.write().unwrap().clear();
        Ok(())
    }

    async fn prune(&self, scope: &str) -> Result<(), ToolGateError> {
        let mut scopes = self.scopes.write().unwrap();
        if let Some(records) = scopes.get_mut(scope) {
            Self::compact_locked(records, self.capacity_per_scope);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_search_returns_closest_match_above_threshold() {
        let store = InMemoryVectorStore::new(100);
        store.add("svc.tool", vec![1.0, 0.0], serde_json::json!("a"), Duration::from_secs(60)).await.unwrap();
        store.add("svc.tool", vec![0.0, 1.0], serde_json::json!("b"), Duration::from_secs(60)).await.unwrap();

        let hits = store.search("svc.tool", &[1.0, 0.0], 1, 0.9).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, serde_json::json!("a"));
    }

    #[tokio::test]
    async fn search_excludes_expired_records() {
        let store = InMemoryVectorStore::new(100);
        store.add("svc.tool", vec![1.0, 0.0], serde_json::json!("a"), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let hits = store.search("svc.tool", &[1.0, 0.0], 1, 0.0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_is_scoped_independently_per_key() {
        let store = InMemoryVectorStore::new(100);
        store.add("svc.tool_a", vec![1.0, 0.0], serde_json::json!("a"), Duration::from_secs(60)).await.unwrap();

        let hits = store.search("svc.tool_b", &[1.0, 0.0], 1, 0.0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn capacity_bound_evicts_least_recently_accessed() {
        let store = InMemoryVectorStore::new(1);
        store.add("svc.tool", vec![1.0, 0.0], serde_json::json!("first"), Duration::from_secs(60)).await.unwrap();
        // Force a compaction pass by adding past the threshold directly.
        store.add("svc.tool", vec![0.0, 1.0], serde_json::json!("second"), Duration::from_secs(60)).await.unwrap();
        store.prune("svc.tool").await.unwrap();

        let hits = store.search("svc.tool", &[0.0, 1.0], 10, 0.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, serde_json::json!("second"));
    }

    #[tokio::test]
    async fn clear_empties_all_scopes() {
        let store = InMemoryVectorStore::new(100);
        store.add("svc.tool", vec![1.0, 0.0], serde_json::json!("a"), Duration::from_secs(60)).await.unwrap();
        store.clear().await.unwrap();
        let hits = store.search("svc.tool", &[1.0, 0.0], 1, 0.0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn add_rejects_a_vector_whose_length_differs_from_the_scope() {
        let store = InMemoryVectorStore::new(100);
        store.add("svc.tool", vec![1.0, 0.0], serde_json::json!("a"), Duration::from_secs(60)).await.unwrap();

        let err = store
            .add("svc.tool", vec![1.0, 0.0, 0.0], serde_json::json!("b"), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolGateError::ConfigInvalid(_)));
    }

    #[tokio::test]
    async fn search_rejects_a_query_whose_length_differs_from_the_scope() {
        let store = InMemoryVectorStore::new(100);
        store.add("svc.tool", vec![1.0, 0.0], serde_json::json!("a"), Duration::from_secs(60)).await.unwrap();

        let err = store.search("svc.tool", &[1.0, 0.0, 0.0], 1, 0.0).await.unwrap_err();
        assert!(matches!(err, ToolGateError::ConfigInvalid(_)));
    }

    #[tokio::test]
    async fn clear_resets_the_recorded_dimension() {
        let store = InMemoryVectorStore::new(100);
        store.add("svc.tool", vec![1.0, 0.0], serde_json::json!("a"), Duration::from_secs(60)).await.unwrap();
        store.clear().await.unwrap();

        // A 3-dimensional vector is now accepted since the scope was reset.
        store.add("svc.tool", vec![1.0, 0.0, 0.0], serde_json::json!("b"), Duration::from_secs(60)).await.unwrap();
    }
}
